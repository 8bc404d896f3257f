use sensor_panel::{Channel, DisplayState, OpenOptions, SubscriptionManager, open_with};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    // Mock only offers three sensors so the "not found" path shows up too.
    // Run with: --features mock
    let opts = OpenOptions::new()
        .allow_mock(true)
        .mock_channels([Channel::Proximity, Channel::RotationVector, Channel::Accelerometer])
        .mock_hz(20.0);
    let dev = open_with(opts).await?;
    println!("Mock panel backend={:?}", dev.info().backend);

    let mut panel = SubscriptionManager::new(dev, DisplayState::new());
    for c in Channel::ALL {
        panel.start(c);
    }

    let mut n = 0u32;
    while panel.next_update().await.is_some() {
        if n % 20 == 0 {
            print!("{}", panel.sink().render());
            for msg in panel.sink().notifications() {
                println!("! {msg}");
            }
            println!();
        }
        n += 1;
        if n == 200 {
            panel.stop_all();
        }
    }
    Ok(())
}
