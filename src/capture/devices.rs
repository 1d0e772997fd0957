use super::CaptureError;
use crate::flow::IPAddress;
use pcap::Device;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub struct DeviceAddress {
    pub ip: IPAddress,
    pub netmask: Option<IPAddress>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeviceInfo {
    pub name: String,
    pub description: Option<String>,
    pub addresses: Vec<DeviceAddress>,
}

/// Interfaces libpcap can open, limited to the ones holding an address.
pub fn list_devices() -> Result<Vec<DeviceInfo>, CaptureError> {
    let devices = Device::list()?
        .into_iter()
        .filter(|device| !device.addresses.is_empty())
        .map(|device| DeviceInfo {
            name: device.name,
            description: device.desc,
            addresses: device
                .addresses
                .into_iter()
                .map(|address| DeviceAddress {
                    ip: address.addr.into(),
                    netmask: address.netmask.map(Into::into),
                })
                .collect(),
        })
        .collect();
    Ok(devices)
}

impl fmt::Display for DeviceInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Name: {}", self.name)?;
        writeln!(f, "Description: {}", self.description.as_deref().unwrap_or(""))?;
        writeln!(f, "Addresses:")?;
        for address in &self.addresses {
            writeln!(f, "- IP address: {}", address.ip)?;
            match &address.netmask {
                Some(mask) => writeln!(f, "  Subnet mask: {mask}")?,
                None => writeln!(f, "  Subnet mask: -")?,
            }
        }
        Ok(())
    }
}
