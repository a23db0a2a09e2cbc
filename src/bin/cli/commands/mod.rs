pub mod add;
pub mod list;
pub mod order;
pub mod phrase;
pub mod show;
pub mod wake;
