pub mod app;
pub mod form_renderer;
