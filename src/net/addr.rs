//! Fixed-size network address value type.

use std::cmp::Ordering;
use std::fmt;
use std::net::{AddrParseError, IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::str::FromStr;

/// Address family of a [`NetAddr`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Family {
    V4,
    V6,
}

impl Family {
    /// Number of significant address bytes for this family.
    #[inline]
    pub const fn octet_len(self) -> usize {
        match self {
            Family::V4 => 4,
            Family::V6 => 16,
        }
    }
}

/// A network address: family, address bytes and port.
///
/// IPv4 addresses use the first 4 bytes of the buffer; the remainder is
/// always zero, so derived equality and hashing compare family, the
/// significant bytes and the port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NetAddr {
    family: Family,
    ip: [u8; 16],
    port: u16,
}

impl NetAddr {
    /// Create an address from an IP and port.
    pub fn new(ip: IpAddr, port: u16) -> Self {
        let mut buf = [0u8; 16];
        let family = match ip {
            IpAddr::V4(v4) => {
                buf[..4].copy_from_slice(&v4.octets());
                Family::V4
            }
            IpAddr::V6(v6) => {
                buf.copy_from_slice(&v6.octets());
                Family::V6
            }
        };
        Self {
            family,
            ip: buf,
            port,
        }
    }

    /// `127.0.0.1` with port 0.
    pub fn localhost_v4() -> Self {
        Self::from(Ipv4Addr::LOCALHOST)
    }

    /// `::1` with port 0.
    pub fn localhost_v6() -> Self {
        Self::from(Ipv6Addr::LOCALHOST)
    }

    #[inline]
    pub fn family(&self) -> Family {
        self.family
    }

    #[inline]
    pub fn port(&self) -> u16 {
        self.port
    }

    /// The significant address bytes (4 for v4, 16 for v6).
    #[inline]
    pub fn octets(&self) -> &[u8] {
        &self.ip[..self.family.octet_len()]
    }

    /// Same address with a different port.
    #[inline]
    pub fn with_port(self, port: u16) -> Self {
        Self { port, ..self }
    }

    /// Same address with the port cleared.
    #[inline]
    pub fn host(self) -> Self {
        self.with_port(0)
    }

    pub fn ip(&self) -> IpAddr {
        match self.family {
            Family::V4 => IpAddr::V4(Ipv4Addr::new(
                self.ip[0], self.ip[1], self.ip[2], self.ip[3],
            )),
            Family::V6 => IpAddr::V6(Ipv6Addr::from(self.ip)),
        }
    }

    /// Byte-wise comparison of the address bytes only (port ignored).
    ///
    /// Addresses of different families compare by family first.
    pub fn cmp_octets(&self, other: &Self) -> Ordering {
        match (self.family, other.family) {
            (Family::V4, Family::V6) => Ordering::Less,
            (Family::V6, Family::V4) => Ordering::Greater,
            _ => self.octets().cmp(other.octets()),
        }
    }
}

impl From<IpAddr> for NetAddr {
    fn from(ip: IpAddr) -> Self {
        Self::new(ip, 0)
    }
}

impl From<Ipv4Addr> for NetAddr {
    fn from(ip: Ipv4Addr) -> Self {
        Self::new(IpAddr::V4(ip), 0)
    }
}

impl From<Ipv6Addr> for NetAddr {
    fn from(ip: Ipv6Addr) -> Self {
        Self::new(IpAddr::V6(ip), 0)
    }
}

impl From<SocketAddr> for NetAddr {
    fn from(addr: SocketAddr) -> Self {
        Self::new(addr.ip(), addr.port())
    }
}

impl FromStr for NetAddr {
    type Err = AddrParseError;

    /// Accepts `1.2.3.4`, `::1`, `1.2.3.4:8303` and `[::1]:8303`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Ok(sock) = s.parse::<SocketAddr>() {
            return Ok(sock.into());
        }
        s.parse::<IpAddr>().map(Self::from)
    }
}

impl fmt::Display for NetAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.port == 0 {
            write!(f, "{}", self.ip())
        } else {
            write!(f, "{}", SocketAddr::new(self.ip(), self.port))
        }
    }
}
