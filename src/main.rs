use std::io;

use font_converter::action::app::run_app;

fn main() -> io::Result<()> {
    run_app()?;
    log::info!("程式執行完成");
    Ok(())
}
