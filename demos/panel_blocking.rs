use sensor_panel::{Channel, DisplayState, SubscriptionManager, open_blocking};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let dev = open_blocking()?;
    println!("Streaming (blocking)… Ctrl-C to exit, backend={:?}", dev.info().backend);

    let mut panel = SubscriptionManager::new(dev, DisplayState::new());
    panel.start(Channel::RotationVector);
    panel.start(Channel::Accelerometer);

    while let Some(c) = panel.next_update_blocking() {
        println!("{:<24} {}", c.label(), panel.sink().text(c));
    }
    println!("(no active sensors)");
    Ok(())
}
