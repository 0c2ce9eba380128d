pub mod fitness_endpoints;
pub mod media_endpoints;
pub mod node_endpoints;
pub mod session_endpoints;
