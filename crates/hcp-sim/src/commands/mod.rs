pub mod resume;
pub mod run;
pub mod score;
