use std::sync::RwLock;

/// Singleton position state for the player running the client.
///
/// Holds the current and the announced next position (the movement target
/// used for interpolation). Consumed by range queries and the eviction
/// sweep; this is not an entity record and lives in no store map.
#[derive(Debug, Default)]
pub struct LocalPlayer {
    state: RwLock<Position>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct Position {
    pos_x: f32,
    pos_y: f32,
    next_pos_x: f32,
    next_pos_y: f32,
}

impl LocalPlayer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update_position(&self, pos_x: f32, pos_y: f32) {
        let mut state = self.state.write().unwrap();
        state.pos_x = pos_x;
        state.pos_y = pos_y;
    }

    pub fn update_next_position(&self, pos_x: f32, pos_y: f32) {
        let mut state = self.state.write().unwrap();
        state.next_pos_x = pos_x;
        state.next_pos_y = pos_y;
    }

    pub fn position(&self) -> (f32, f32) {
        let state = self.state.read().unwrap();
        (state.pos_x, state.pos_y)
    }

    pub fn next_position(&self) -> (f32, f32) {
        let state = self.state.read().unwrap();
        (state.next_pos_x, state.next_pos_y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positions_update_independently() {
        let local = LocalPlayer::new();
        assert_eq!(local.position(), (0.0, 0.0));

        local.update_position(10.0, -5.0);
        local.update_next_position(12.0, -4.0);

        assert_eq!(local.position(), (10.0, -5.0));
        assert_eq!(local.next_position(), (12.0, -4.0));

        local.update_position(11.0, -4.5);
        assert_eq!(local.next_position(), (12.0, -4.0));
    }
}
