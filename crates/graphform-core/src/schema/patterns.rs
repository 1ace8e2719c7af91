// ── String validation patterns ──
//
// Pure match / no-match helpers used by field validators.

use std::net::Ipv4Addr;
use std::sync::LazyLock;

use regex::Regex;

/// Maximum length of a resource name.
pub const MAX_NAME_LEN: usize = 63;

static NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z]([a-z0-9-]*[a-z0-9])?$").expect("name pattern compiles"));

static SSH_PUBLIC_KEY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^ssh-(rsa|ed25519) AAAA[0-9A-Za-z+/]+={0,3}( [^@\s]+@[^@\s]+)?$")
        .expect("ssh key pattern compiles")
});

static CRN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^crn:v\d:[A-Za-z0-9_.-]+(:[A-Za-z0-9_./-]*){7}$").expect("crn pattern compiles")
});

static TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9:_ .-]{1,128}$").expect("tag pattern compiles"));

static KUBE_VERSION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(default|\d+\.\d+(\.\d+)?(_openshift)?)$").expect("kube version pattern compiles")
});

static DOMAIN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([a-z0-9]([a-z0-9-]*[a-z0-9])?\.)+[a-z]{2,}$").expect("domain pattern compiles")
});

/// Lowercase alphanumeric with inner dashes, starting with a letter.
pub fn is_valid_name(name: &str) -> bool {
    name.len() <= MAX_NAME_LEN && NAME.is_match(name)
}

/// A dotted DNS zone name: `example.com`.
pub fn is_domain(value: &str) -> bool {
    value.len() <= 253 && DOMAIN.is_match(value)
}

pub fn is_ssh_public_key(key: &str) -> bool {
    SSH_PUBLIC_KEY.is_match(key.trim())
}

pub fn is_crn(value: &str) -> bool {
    CRN.is_match(value)
}

pub fn is_tag(value: &str) -> bool {
    TAG.is_match(value)
}

pub fn is_kube_version(value: &str) -> bool {
    KUBE_VERSION.is_match(value)
}

pub fn is_ipv4_address(value: &str) -> bool {
    value.parse::<Ipv4Addr>().is_ok()
}

/// An IPv4 CIDR block: `10.10.10.0/24`. Host bits must be zero.
pub fn is_ipv4_cidr(value: &str) -> bool {
    parse_cidr(value).is_some()
}

pub fn is_ipv4_cidr_or_address(value: &str) -> bool {
    is_ipv4_address(value) || is_ipv4_cidr(value)
}

/// Comma separated list of addresses or CIDR blocks, at least one entry.
pub fn is_ip_list(value: &str) -> bool {
    let entries: Vec<&str> = value.split(',').map(str::trim).collect();
    !entries.is_empty() && entries.iter().all(|e| is_ipv4_cidr_or_address(e))
}

pub fn is_port(value: i64) -> bool {
    (1..=65535).contains(&value)
}

/// `(network, prefix_len)` for a CIDR with zeroed host bits.
pub fn parse_cidr(value: &str) -> Option<(u32, u8)> {
    let (addr, prefix) = value.trim().split_once('/')?;
    let addr: Ipv4Addr = addr.parse().ok()?;
    let prefix: u8 = prefix.parse().ok()?;
    if prefix > 32 {
        return None;
    }
    let bits = u32::from(addr);
    if bits & !mask(prefix) != 0 {
        return None;
    }
    Some((bits, prefix))
}

/// Number of addresses in a CIDR block.
pub fn cidr_size(value: &str) -> Option<u64> {
    parse_cidr(value).map(|(_, prefix)| 1u64 << (32 - u32::from(prefix)))
}

/// `true` when two CIDR blocks share at least one address.
pub fn cidrs_overlap(a: &str, b: &str) -> bool {
    let (Some((net_a, len_a)), Some((net_b, len_b))) = (parse_cidr(a), parse_cidr(b)) else {
        return false;
    };
    let shorter = mask(len_a.min(len_b));
    net_a & shorter == net_b & shorter
}

fn mask(prefix: u8) -> u32 {
    if prefix == 0 {
        0
    } else {
        u32::MAX << (32 - u32::from(prefix))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names() {
        assert!(is_valid_name("management-vpc"));
        assert!(is_valid_name("a"));
        assert!(!is_valid_name("Management"));
        assert!(!is_valid_name("-edge"));
        assert!(!is_valid_name("edge-"));
        assert!(!is_valid_name("1edge"));
        assert!(!is_valid_name(&"a".repeat(64)));
    }

    #[test]
    fn cidr_blocks() {
        assert!(is_ipv4_cidr("10.10.10.0/24"));
        assert!(!is_ipv4_cidr("10.10.10.1/24"));
        assert!(!is_ipv4_cidr("10.10.10.0/33"));
        assert!(!is_ipv4_cidr("10.10.10.0"));
        assert!(is_ipv4_cidr_or_address("10.10.10.1"));
        assert_eq!(cidr_size("10.0.0.0/28"), Some(16));
    }

    #[test]
    fn overlap() {
        assert!(cidrs_overlap("10.10.0.0/16", "10.10.20.0/24"));
        assert!(cidrs_overlap("10.10.20.0/24", "10.10.0.0/16"));
        assert!(!cidrs_overlap("10.10.10.0/24", "10.10.20.0/24"));
        assert!(!cidrs_overlap("garbage", "10.10.20.0/24"));
    }

    #[test]
    fn ip_lists() {
        assert!(is_ip_list("10.0.0.1, 192.168.0.0/16"));
        assert!(!is_ip_list("10.0.0.1,"));
        assert!(!is_ip_list("nope"));
    }

    #[test]
    fn domains() {
        assert!(is_domain("example.com"));
        assert!(is_domain("internal.slz.example.com"));
        assert!(!is_domain("example"));
        assert!(!is_domain("-bad.com"));
        assert!(!is_domain("Example.com"));
    }

    #[test]
    fn ssh_keys_and_crns() {
        assert!(is_ssh_public_key("ssh-rsa AAAAB3NzaC1yc2E= user@host"));
        assert!(is_ssh_public_key("ssh-ed25519 AAAAC3NzaC1lZDI1NTE5"));
        assert!(!is_ssh_public_key("rsa AAAAB3Nza"));
        assert!(is_crn("crn:v1:bluemix:public:cloudcerts:us-south:a/abc:1234::"));
        assert!(!is_crn("crn:v1:bluemix"));
    }

    #[test]
    fn kube_versions_and_tags() {
        assert!(is_kube_version("default"));
        assert!(is_kube_version("4.14_openshift"));
        assert!(is_kube_version("1.29.3"));
        assert!(!is_kube_version("latest"));
        assert!(is_tag("env:dev"));
        assert!(!is_tag(""));
    }
}
