pub mod examples;
pub mod playground;
pub mod run;
