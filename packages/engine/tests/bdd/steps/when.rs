//! When step definitions
//!
//! Steps that run the assembly pipeline.

use cucumber::when;

use crate::world::AssemblyWorld;

#[when("the document is assembled")]
fn assemble_document(world: &mut AssemblyWorld) {
    world.assemble();
}
