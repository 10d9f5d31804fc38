use crate::cli::open_db;
use crate::error::Result;
use crate::server;
use crate::settings::load_settings;

pub fn run(listen: Option<String>) -> Result<()> {
    let mut settings = load_settings();
    if let Some(addr) = listen {
        settings.listen_addr = addr;
    }
    settings.billing_cycles.validate()?;
    let conn = open_db()?;

    println!("Serving on http://{}", settings.listen_addr);
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(server::serve(conn, settings))
}
