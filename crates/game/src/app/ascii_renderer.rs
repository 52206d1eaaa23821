use dungeon_engine::{tile_view, world_bounds, Direction, LevelRenderer, Location, World};

const MAX_VIEW_TILES: i64 = 48;

/// Draws the level top-down with north up. Every tile takes the odd cell of a
/// doubled grid so walls can sit on the even cells between tiles.
#[derive(Debug, Default)]
pub(crate) struct AsciiRenderer {
    frames_drawn: u64,
}

impl AsciiRenderer {
    pub(crate) fn frames_drawn(&self) -> u64 {
        self.frames_drawn
    }
}

impl LevelRenderer for AsciiRenderer {
    type Output = String;

    fn render(&mut self, world: &World, now_ms: u64) -> String {
        self.frames_drawn += 1;
        let header = format!(
            "level age {:.1}s, {} creatures",
            world.level().age_seconds(now_ms),
            world.creatures().len()
        );
        let Some((min, max)) = world_bounds(world) else {
            return format!("{header}\n(empty level)\n");
        };

        let focus = player_location(world);
        let (left, columns) = view_window(min.x, max.x, focus.map(|at| at.x));
        let (bottom, rows) = view_window(min.y, max.y, focus.map(|at| at.y));
        let top = bottom + (rows as i32 - 1);
        let mut grid = vec![vec![' '; columns * 2 + 1]; rows * 2 + 1];

        for row in 0..rows {
            for column in 0..columns {
                let location = Location::new(left + column as i32, top - row as i32);
                let view = tile_view(world, location);
                let (cx, cy) = (column * 2 + 1, row * 2 + 1);

                grid[cy][cx] = match view.creature_facing {
                    Some(facing) if view.is_player => facing_glyph(facing),
                    Some(_) => 'M',
                    None if view.has_column => 'O',
                    None if view.has_floor => '.',
                    None => ' ',
                };
                for direction in Direction::ALL {
                    if !view.walls[direction.index()] {
                        continue;
                    }
                    match direction {
                        Direction::East => grid[cy][cx + 1] = '|',
                        Direction::West => grid[cy][cx - 1] = '|',
                        Direction::North => grid[cy - 1][cx] = '-',
                        Direction::South => grid[cy + 1][cx] = '-',
                    }
                }
            }
        }

        let mut out = header;
        out.push('\n');
        for line in grid {
            let line: String = line.into_iter().collect();
            out.push_str(line.trim_end());
            out.push('\n');
        }
        out
    }
}

fn player_location(world: &World) -> Option<Location> {
    let creature = world.creature_for_actor(world.player()?)?;
    world.location_of(creature)
}

fn view_window(min: i32, max: i32, focus: Option<i32>) -> (i32, usize) {
    let span = i64::from(max) - i64::from(min) + 1;
    if span <= MAX_VIEW_TILES {
        return (min, span as usize);
    }
    let start = focus
        .map(|at| i64::from(at) - MAX_VIEW_TILES / 2)
        .unwrap_or(i64::from(min))
        .clamp(i64::from(min), i64::from(max) - MAX_VIEW_TILES + 1);
    (
        i32::try_from(start).unwrap_or(min),
        MAX_VIEW_TILES as usize,
    )
}

fn facing_glyph(facing: Direction) -> char {
    match facing {
        Direction::East => '>',
        Direction::North => '^',
        Direction::West => '<',
        Direction::South => 'v',
    }
}
