use reflab_server::{AppConfig, ReflabServer};

#[tokio::main]
async fn main() {
    // Load .env if present so local development can set the environment there.
    if let Err(e) = dotenvy::dotenv() {
        if !matches!(e, dotenvy::Error::Io(ref io_err) if io_err.kind() == std::io::ErrorKind::NotFound)
        {
            eprintln!("Warning: Failed to load .env file: {e}");
        }
    }

    reflab_server::observability::init_tracing();

    let config = match AppConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            std::process::exit(2);
        }
    };

    if let Err(err) = ReflabServer::new(config).run().await {
        eprintln!("Server error: {err}");
        std::process::exit(1);
    }
}
