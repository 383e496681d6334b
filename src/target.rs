use std::net::{IpAddr, SocketAddr};
use std::path::Path;

use anyhow::{bail, Result};

/// Port the console listens on when none is given
pub const DEFAULT_PORT: u16 = 5000;

/// Turns `host` or `host:port` into something `TcpStream::connect` accepts
pub fn with_default_port(target: &str) -> Result<String> {
    if let Ok(addr) = target.parse::<SocketAddr>() {
        if addr.port() == 0 {
            bail!("Invalid port 0 in {target:?}");
        }
        return Ok(target.to_string());
    }
    if let Ok(ip) = target.parse::<IpAddr>() {
        return Ok(SocketAddr::new(ip, DEFAULT_PORT).to_string());
    }

    match target.rsplit_once(':') {
        Some((host, port)) => {
            if host.is_empty() {
                bail!("Missing host in {target:?}");
            }
            match port.parse::<u16>() {
                Ok(0) | Err(_) => bail!("Invalid port {port:?}"),
                Ok(_) => Ok(target.to_string()),
            }
        }
        None if target.is_empty() => bail!("Missing host"),
        None => Ok(format!("{target}:{DEFAULT_PORT}")),
    }
}

/// Checks for a `.cia` extension, in any case
pub fn is_cia_file(path: &Path) -> bool {
    path.extension()
        .map_or(false, |ext| ext.eq_ignore_ascii_case("cia"))
}
