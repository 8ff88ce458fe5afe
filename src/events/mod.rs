pub mod interaction;

pub use interaction::handle_interaction;
