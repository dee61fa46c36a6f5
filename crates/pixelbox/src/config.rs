//! Device selection from flags, environment and the JSON device file.

use std::fs;
use std::path::{Path, PathBuf};

use pixelbox_device::DEFAULT_RFCOMM_CHANNEL;
use pixelbox_transport::BdAddr;
use serde::Deserialize;

use crate::exit::{io_error, CliError, CliResult, DATA_INVALID};

/// Contents of a device file. Unknown keys (such as an HTTP `server`
/// block) are ignored.
#[derive(Debug, Deserialize, PartialEq, Eq)]
pub struct ConfigFile {
    #[serde(default)]
    pub devices: Vec<DeviceEntry>,
}

#[derive(Debug, Deserialize, PartialEq, Eq)]
pub struct DeviceEntry {
    pub name: String,
    pub mac: String,
    #[serde(default)]
    pub channel: Option<u8>,
}

impl ConfigFile {
    pub fn load(path: &Path) -> CliResult<Self> {
        let raw = fs::read_to_string(path)
            .map_err(|err| io_error(&format!("failed reading {}", path.display()), err))?;
        serde_json::from_str(&raw).map_err(|err| {
            CliError::new(
                DATA_INVALID,
                format!("invalid device file {}: {err}", path.display()),
            )
        })
    }

    /// The entry called `name`, or the first entry when no name is given.
    pub fn select(&self, name: Option<&str>) -> CliResult<&DeviceEntry> {
        match name {
            Some(name) => self
                .devices
                .iter()
                .find(|d| d.name == name)
                .ok_or_else(|| CliError::usage(format!("no device named {name:?} in device file"))),
            None => self
                .devices
                .first()
                .ok_or_else(|| CliError::usage("device file lists no devices")),
        }
    }
}

/// Where commands are delivered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Rfcomm { address: BdAddr, channel: u8 },
    Unix(PathBuf),
}

/// Raw selection inputs, as parsed from the command line.
#[derive(Debug, Default, Clone)]
pub struct Selection<'a> {
    pub mac: Option<&'a str>,
    pub channel: Option<u8>,
    pub config: Option<&'a Path>,
    pub device: Option<&'a str>,
    pub unix: Option<&'a Path>,
}

/// Resolve the device to talk to.
///
/// `--unix` wins, then an explicit `--mac`, then the device file. An
/// explicit `--channel` overrides the channel from the device file.
pub fn resolve_target(selection: &Selection<'_>) -> CliResult<Target> {
    if let Some(path) = selection.unix {
        return Ok(Target::Unix(path.to_path_buf()));
    }

    let (mac, file_channel) = match (selection.mac, selection.config) {
        (Some(mac), _) => (mac.to_string(), None),
        (None, Some(path)) => {
            let file = ConfigFile::load(path)?;
            let entry = file.select(selection.device)?;
            (entry.mac.clone(), entry.channel)
        }
        (None, None) => {
            return Err(CliError::usage(
                "no device selected: pass --mac, --config or --unix",
            ))
        }
    };

    let address: BdAddr = mac
        .parse()
        .map_err(|err| CliError::usage(format!("{err}")))?;
    let channel = selection
        .channel
        .or(file_channel)
        .unwrap_or(DEFAULT_RFCOMM_CHANNEL);
    Ok(Target::Rfcomm { address, channel })
}
