pub mod anim;
pub mod board;
pub mod economy;
pub mod error;
pub mod letters;
