//! CIDR network parsing

use crate::dat::types::AddressFamily;
use crate::error::{GeoDatError, Result};
use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

/// One network to insert: base address and prefix length
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NetworkEntry {
    /// Base address
    pub addr: IpAddr,
    /// Prefix length (0-32 for IPv4, 0-128 for IPv6)
    pub prefix_len: u8,
}

impl NetworkEntry {
    /// Create a network, rejecting bad prefixes and set host bits
    pub fn new(addr: IpAddr, prefix_len: u8) -> Result<Self> {
        let entry = Self { addr, prefix_len };
        let max_prefix = entry.family().bits();
        if prefix_len > max_prefix {
            return Err(GeoDatError::invalid_network(
                &format!("{}/{}", addr, prefix_len),
                format!("prefix length {} exceeds {}", prefix_len, max_prefix),
            ));
        }

        let host_bits = max_prefix - prefix_len;
        let host_mask = if host_bits == 0 {
            0
        } else {
            u128::MAX >> (128 - host_bits as u32)
        };
        if entry.bits() & host_mask != 0 {
            return Err(GeoDatError::invalid_network(
                &entry.to_string(),
                "host bits set",
            ));
        }

        Ok(entry)
    }

    /// Address family of the base address
    pub fn family(&self) -> AddressFamily {
        match self.addr {
            IpAddr::V4(_) => AddressFamily::V4,
            IpAddr::V6(_) => AddressFamily::V6,
        }
    }

    /// Base address as an integer (IPv4 in the low 32 bits)
    pub fn bits(&self) -> u128 {
        match self.addr {
            IpAddr::V4(v4) => u32::from(v4) as u128,
            IpAddr::V6(v6) => u128::from(v6),
        }
    }
}

impl FromStr for NetworkEntry {
    type Err = GeoDatError;

    /// Parse `address/prefix`; a bare address is a full-length network
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if let Ok(addr) = s.parse::<IpAddr>() {
            let prefix_len = if addr.is_ipv4() { 32 } else { 128 };
            return Self::new(addr, prefix_len);
        }

        let (addr_str, prefix_str) = s
            .split_once('/')
            .ok_or_else(|| GeoDatError::invalid_network(s, "expected address/prefix"))?;
        let addr = addr_str
            .parse::<IpAddr>()
            .map_err(|e| GeoDatError::invalid_network(s, e.to_string()))?;
        let prefix_len = prefix_str
            .parse::<u8>()
            .map_err(|_| GeoDatError::invalid_network(s, "invalid prefix length"))?;

        Self::new(addr, prefix_len)
    }
}

impl fmt::Display for NetworkEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.addr, self.prefix_len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_cidr() {
        let net: NetworkEntry = "192.168.0.0/16".parse().unwrap();
        assert_eq!(net.addr.to_string(), "192.168.0.0");
        assert_eq!(net.prefix_len, 16);
        assert_eq!(net.bits(), 0xC0A8_0000);
        assert_eq!(net.family(), AddressFamily::V4);
    }

    #[test]
    fn test_parse_bare_address() {
        let net: NetworkEntry = "2001:4860:4860::8888".parse().unwrap();
        assert_eq!(net.prefix_len, 128);
        assert_eq!(net.family(), AddressFamily::V6);
    }

    #[test]
    fn test_parse_zero_prefix() {
        let net: NetworkEntry = "0.0.0.0/0".parse().unwrap();
        assert_eq!(net.prefix_len, 0);
        assert_eq!(net.to_string(), "0.0.0.0/0");
    }

    #[test]
    fn test_rejects_malformed() {
        assert!("1.2.3.0/33".parse::<NetworkEntry>().is_err());
        assert!("::/129".parse::<NetworkEntry>().is_err());
        assert!("1.2.3/24".parse::<NetworkEntry>().is_err());
        assert!("1.2.3.0/abc".parse::<NetworkEntry>().is_err());
        assert!("not a network".parse::<NetworkEntry>().is_err());
    }

    #[test]
    fn test_rejects_host_bits() {
        let err = "1.2.3.4/24".parse::<NetworkEntry>().unwrap_err();
        assert!(err.to_string().contains("host bits set"));
        assert!("2001:db8::1/64".parse::<NetworkEntry>().is_err());
    }
}
