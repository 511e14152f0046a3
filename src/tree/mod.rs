pub mod expansion;
pub mod index;
pub mod node;
pub mod path;
pub mod search;
pub mod store;
