use core::convert::Infallible;
use core::sync::atomic::{AtomicI32, Ordering};

use clap::Parser;
use dmb_core::utils::{
    controllers::{
        ControllerConfig, DriveOutput, LineSensor, LineSensors, ModeSwitch, SystemController,
    },
    http, DriveCommand, Duration, Timer,
};
use embassy_executor::{Executor, Spawner};
use embassy_net::{Config, Ipv4Address, Ipv4Cidr, Runner, Stack, StackResources};
use embassy_net_tuntap::TunTapDevice;
use embedded_hal::digital::{ErrorType, InputPin};
use heapless::Vec;
use rand_core::{OsRng, TryRngCore};
use static_cell::StaticCell;
use tracing::{error, info};

#[derive(Parser)]
#[clap(version = "1.0")]
struct Opts {
    /// TAP device name
    #[clap(long, default_value = "tap0")]
    tap: String,
    /// use a static IP instead of DHCP
    #[clap(long)]
    static_ip: bool,
    /// HTTP port for the control page and command routes
    #[clap(long, default_value_t = 8000)]
    port: u16,
    /// analog reading above which a sensor counts as over the line
    #[clap(long, default_value_t = 2000)]
    threshold: u16,
    /// initial speed cap (0-255)
    #[clap(long, default_value_t = 150)]
    speed: u8,
}

/// Lateral offset of the simulated line under the chassis, in millimetres.
static LINE_OFFSET: AtomicI32 = AtomicI32::new(0);

/// Sensor spacing from the chassis centre line (mm).
const SENSOR_SPACING: i32 = 12;
/// Half the tape width (mm).
const LINE_HALF_WIDTH: i32 = 15;
/// How far the track curves away per sensor read (mm).
const TRACK_DRIFT: i32 = 1;

#[derive(Clone, Copy)]
enum Side {
    Left,
    Right,
}

/// ADC reading derived from where the simulated line sits under the sensor.
struct SimSensor(Side);

impl LineSensor for SimSensor {
    type Error = Infallible;

    fn read_raw(&mut self) -> Result<u16, Self::Error> {
        let position = match self.0 {
            Side::Left => {
                LINE_OFFSET.fetch_add(TRACK_DRIFT, Ordering::Relaxed);
                -SENSOR_SPACING
            }
            Side::Right => SENSOR_SPACING,
        };
        let offset = LINE_OFFSET.load(Ordering::Relaxed);
        Ok(if (position - offset).abs() <= LINE_HALF_WIDTH {
            3200
        } else {
            400
        })
    }
}

/// Drive output that logs each command and steers the simulated line.
struct SimDrive;

impl DriveOutput for SimDrive {
    type Error = Infallible;

    fn apply(
        &mut self,
        cmd: DriveCommand,
    ) -> Result<(), Self::Error> {
        // turning left moves the line towards the right of the chassis
        let turn = (i32::from(cmd.left) - i32::from(cmd.right)) / 100;
        let offset = LINE_OFFSET.fetch_sub(turn, Ordering::Relaxed) - turn;
        info!(left = cmd.left, right = cmd.right, offset, "drive");
        Ok(())
    }
}

/// Mode toggle that is never pressed (idle high on the pull-up).
struct IdleSwitch;

impl ErrorType for IdleSwitch {
    type Error = Infallible;
}

impl InputPin for IdleSwitch {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(true)
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(false)
    }
}

#[embassy_executor::task]
async fn net_task(mut runner: Runner<'static, TunTapDevice>) -> ! {
    runner.run().await
}

#[embassy_executor::task]
async fn control_task(mut ctrl: SystemController<SimDrive, SimSensor, IdleSwitch>) -> ! {
    ctrl.run().await
}

/// Wait for the link and an IPv4 address.
async fn wait_for_network(stack: Stack<'static>) {
    while !stack.is_link_up() {
        Timer::after(Duration::from_millis(500)).await;
    }

    info!("Waiting to get IP address...");
    loop {
        if let Some(config) = stack.config_v4() {
            info!("Got IP: {}", config.address);
            break;
        }
        Timer::after(Duration::from_millis(500)).await;
    }
}

#[embassy_executor::task]
async fn main_task(spawner: Spawner) {
    let opts: Opts = Opts::parse();

    let config = ControllerConfig {
        line_threshold: opts.threshold,
        initial_speed_cap: opts.speed,
        ..ControllerConfig::default()
    };
    let sensors = LineSensors::new(SimSensor(Side::Left), SimSensor(Side::Right));
    let ctrl = SystemController::new(SimDrive, sensors, ModeSwitch::new(IdleSwitch), config);
    spawner.spawn(control_task(ctrl)).unwrap();

    // Initialize network
    let device = match TunTapDevice::new(&opts.tap) {
        Ok(device) => device,
        Err(e) => {
            error!("Failed to open TAP device {}: {:?}", opts.tap, e);
            return;
        }
    };
    let net_config = if opts.static_ip {
        Config::ipv4_static(embassy_net::StaticConfigV4 {
            address: Ipv4Cidr::new(Ipv4Address::new(192, 168, 69, 2), 24),
            dns_servers: Vec::new(),
            gateway: Some(Ipv4Address::new(192, 168, 69, 1)),
        })
    } else {
        Config::dhcpv4(Default::default())
    };

    let mut seed_buf = [0; 8];
    if let Err(e) = OsRng.try_fill_bytes(&mut seed_buf) {
        error!("Failed to seed network stack: {:?}", e);
        return;
    }
    let seed = u64::from_le_bytes(seed_buf);

    static RESOURCES: StaticCell<StackResources<3>> = StaticCell::new();
    let (stack, runner) = embassy_net::new(
        device,
        net_config,
        RESOURCES.init(StackResources::<3>::new()),
        seed,
    );
    spawner.spawn(net_task(runner)).unwrap();

    info!("Waiting for network link...");
    wait_for_network(stack).await;

    info!("Starting command server on port {}", opts.port);
    http(0, opts.port, stack, None).await;
}

static EXECUTOR: StaticCell<Executor> = StaticCell::new();

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();
    let executor = EXECUTOR.init(Executor::new());
    executor.run(|spawner| {
        spawner.spawn(main_task(spawner)).unwrap();
    });
}
