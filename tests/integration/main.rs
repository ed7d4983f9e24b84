//! Integration test harness.

mod game_flow;
mod mock_source;
