pub mod session_model;
