mod client_stack;
mod helpers;
mod http_transport;
mod services;
