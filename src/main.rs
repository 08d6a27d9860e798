//! Lightning Node Pro CLI tool

use std::error::Error;
use std::num::ParseIntError;
use std::process;
use std::time::Duration;

use clap::builder::EnumValueParser;
use clap::{
    crate_description, crate_name, crate_version, value_parser, Arg, ArgAction, ArgMatches, Command,
};

use lnpro::usb::DEFAULT_TIMEOUT;
use lnpro::{logging, ChannelMode, Message, PortType, RusbBus, Session, PRODUCT_ID, VENDOR_ID};

/// CLI configuration.
#[derive(PartialEq, Eq, Debug)]
struct Config {
    vendor_id: u16,
    product_id: u16,
    timeout: Duration,
    log_level: &'static str,
}

impl Config {
    fn from_cli(matches: &ArgMatches) -> Self {
        let mut config = Config::default();

        replace_from_cli(&mut config.vendor_id, matches, "vendor-id");
        replace_from_cli(&mut config.product_id, matches, "product-id");

        if let Some(timeout) = matches.get_one::<u64>("timeout") {
            config.timeout = Duration::from_millis(*timeout);
        }

        if matches.get_flag("debug") {
            config.log_level = "debug";
        }

        config
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            vendor_id: VENDOR_ID,
            product_id: PRODUCT_ID,
            timeout: DEFAULT_TIMEOUT,
            log_level: "info",
        }
    }
}

fn main() {
    let matches = cli().get_matches();
    let config = Config::from_cli(&matches);

    if let Err(err) = logging::setup_logging(config.log_level) {
        eprintln!("\x1b[31mError:\x1b[0m unable to setup logging: {err}");
    }

    let messages = messages(&matches);

    match send_messages(&config, &messages) {
        Ok(()) => println!("\x1b[32mSuccessfully applied changes.\x1b[0m"),
        Err(err) => {
            eprintln!("\x1b[31mError:\x1b[0m {err}");
            process::exit(1);
        },
    }
}

/// Send all messages using a single connection.
fn send_messages(config: &Config, messages: &[Message]) -> Result<(), Box<dyn Error>> {
    let bus = RusbBus::new()?.with_timeout(config.timeout);
    let mut session = Session::new(bus);

    session.with_connection(config.vendor_id, config.product_id, |session| {
        for message in messages {
            let response = session.send(message)?;
            println!("{:?}: {:?}", message, response);
        }
        Ok(())
    })?;

    Ok(())
}

/// Messages required for the selected subcommand.
fn messages(matches: &ArgMatches) -> Vec<Message> {
    match matches.subcommand() {
        Some(("trigger", _)) => vec![Message::LedTrigger],
        Some(("clear", _)) => vec![Message::LedClear],
        Some(("groups-clear", _)) => vec![Message::LedGroupsClear],
        Some(("group-set", matches)) => vec![Message::LedGroupSet {
            led_start_index: *required::<u8>(matches, "start"),
            led_count: *required::<u8>(matches, "count"),
            mode: *required::<u8>(matches, "mode"),
        }],
        Some(("mode", matches)) => vec![Message::LedMode(*required(matches, "channel-mode"))],
        Some(("port-type", matches)) => vec![Message::LedPortType(*required(matches, "port-type"))],
        Some(("setup", matches)) => vec![
            Message::LedPortType(*required(matches, "port-type")),
            Message::LedMode(*required(matches, "channel-mode")),
            Message::LedGroupsClear,
            Message::LedGroupSet {
                led_start_index: 0,
                led_count: *required::<u8>(matches, "count"),
                mode: matches.get_one::<u8>("group-mode").copied().unwrap_or_default(),
            },
            Message::LedTrigger,
        ],
        _ => unreachable!("subcommand is required"),
    }
}

/// Get clap CLI parameters.
fn cli() -> Command {
    let channel_mode = || {
        Arg::new("channel-mode")
            .help("Channel LED driver")
            .ignore_case(true)
            .required(true)
            .value_parser(EnumValueParser::<ChannelMode>::new())
    };
    let port_type = || {
        Arg::new("port-type")
            .help("LED chipset connected to the port")
            .ignore_case(true)
            .required(true)
            .value_parser(EnumValueParser::<PortType>::new())
    };
    let byte = |name: &'static str, help: &'static str| {
        Arg::new(name).help(help).long(name).value_parser(value_parser!(u8))
    };

    Command::new(crate_name!())
        .version(crate_version!())
        .author("Christian Duerr <contact@christianduerr.com>")
        .about(crate_description!())
        .subcommand_required(true)
        .arg(
            Arg::new("vendor-id")
                .help("USB vendor ID [default: 0x1b1c]")
                .long("vendor-id")
                .global(true)
                .value_parser(parse_id),
        )
        .arg(
            Arg::new("product-id")
                .help("USB product ID [default: 0x0c0b]")
                .long("product-id")
                .global(true)
                .value_parser(parse_id),
        )
        .arg(
            Arg::new("timeout")
                .help("USB transfer timeout in milliseconds [default: 1000]")
                .long("timeout")
                .global(true)
                .value_parser(value_parser!(u64)),
        )
        .arg(
            Arg::new("debug")
                .help("Log raw packets")
                .long("debug")
                .global(true)
                .action(ArgAction::SetTrue),
        )
        .subcommand(Command::new("trigger").about("Apply the pending LED group configuration"))
        .subcommand(Command::new("clear").about("Clear the LED buffer"))
        .subcommand(Command::new("groups-clear").about("Remove all LED groups"))
        .subcommand(
            Command::new("group-set")
                .about("Define an LED group")
                .arg(byte("start", "Index of the first LED").required(true))
                .arg(byte("count", "Number of LEDs").required(true))
                .arg(byte("mode", "Group render mode").required(true)),
        )
        .subcommand(Command::new("mode").about("Select the channel mode").arg(channel_mode()))
        .subcommand(
            Command::new("port-type").about("Select the port's LED chipset").arg(port_type()),
        )
        .subcommand(
            Command::new("setup")
                .about("Configure and apply a single LED group")
                .arg(port_type().long("port-type"))
                .arg(channel_mode().long("mode"))
                .arg(byte("count", "Number of LEDs").required(true))
                .arg(byte("group-mode", "Group render mode [default: 0]")),
        )
}

/// Parse a USB ID in decimal or `0x` prefixed hex format.
fn parse_id(s: &str) -> Result<u16, ParseIntError> {
    match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u16::from_str_radix(hex, 16),
        None => s.parse(),
    }
}

/// Replace config value with the CLI parameter if it is present.
#[inline]
fn replace_from_cli<T>(option: &mut T, matches: &ArgMatches, name: &str)
where
    T: Clone + Send + Sync + 'static,
{
    if let Some(value) = matches.get_one::<T>(name) {
        *option = value.clone();
    }
}

/// Get a required CLI value.
#[inline]
fn required<'a, T>(matches: &'a ArgMatches, name: &str) -> &'a T
where
    T: Clone + Send + Sync + 'static,
{
    matches.get_one::<T>(name).expect("required argument")
}
