pub mod local_server;
