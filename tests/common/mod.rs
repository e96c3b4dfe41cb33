// Common test utilities and fixtures

pub mod fixtures;
pub mod helpers;

// Re-export commonly used items
// Note: not every test binary uses every helper
#[allow(unused_imports)]
pub use fixtures::{note, EventLog, Note, NoteInterpreter};
#[allow(unused_imports)]
pub use helpers::{
    bodies_of, create_test_services, in_memory_writer, note_pipeline, visible_bodies,
};
