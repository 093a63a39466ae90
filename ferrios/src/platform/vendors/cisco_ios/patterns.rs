//! Cisco IOS output patterns, grouped by concern.

use std::sync::LazyLock;

use regex::Regex;

fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).expect("built-in IOS pattern")
}

// Facts: show version / show interfaces / show vlan

/// `rtr2811 uptime is 4 days, 18 hours, 59 minutes`
pub static RE_HOSTNAME_UPTIME: LazyLock<Regex> =
    LazyLock::new(|| compile(r"(?m)^(\S+)\s+uptime\s+is\s+(.+?)\s*$"));

pub static RE_VERSION: LazyLock<Regex> = LazyLock::new(|| compile(r"Version\s+([^,\s]+)"));

/// `Cisco 2811 (revision 53.51) with 251904K/10240K bytes of memory.`
pub static RE_MODEL: LazyLock<Regex> =
    LazyLock::new(|| compile(r"(?m)^[Cc]isco\s+(\S+)\s+\(.+\)\s+(?:processor|with)"));

pub static RE_SERIAL: LazyLock<Regex> =
    LazyLock::new(|| compile(r"Processor\s+board\s+ID\s+(\S+)"));

pub static RE_CONFIG_REGISTER: LazyLock<Regex> =
    LazyLock::new(|| compile(r"Configuration\s+register\s+is\s+(\S+)"));

pub static RE_SYSTEM_IMAGE: LazyLock<Regex> =
    LazyLock::new(|| compile(r#"System\s+image\s+file\s+is\s+"([^"]+)""#));

/// `FastEthernet0/0 is administratively down, line protocol is down`
pub static RE_INTERFACE: LazyLock<Regex> = LazyLock::new(|| {
    compile(r"(?m)^(\S+)\s+is\s+(?:administratively\s+)?(?:up|down|deleted)")
});

/// A row of the VLAN status table.
pub static RE_VLAN: LazyLock<Regex> = LazyLock::new(|| {
    compile(r"(?m)^(\d{1,4})\s+\S+\s+(?:active|suspended|act/lshut|sus/lshut|act/unsup)")
});

// Boot variables

/// Marker before the next-reload section of `show boot`/`show bootvar`.
pub const BOOT_NEXT_RELOAD: &str = "Boot Variables on next reload";

/// `BOOT variable = flash:image.bin,1;` or `BOOT path-list : flash:image.bin`
pub static RE_BOOT_VARIABLE: LazyLock<Regex> = LazyLock::new(|| {
    compile(r"(?m)(?:BOOT variable[ \t]+=[ \t]*(\S+)[ \t]*$|BOOT path-list[ \t]+:[ \t]*(\S+)[ \t]*$)")
});

/// `boot system flash:image.bin` or `boot system flash image.bin`
pub static RE_BOOT_SYSTEM: LazyLock<Regex> =
    LazyLock::new(|| compile(r"(?m)^\s*boot\s+system\s+(?:\S+[ \t]+)?(\S+)[ \t]*$"));

// File system

/// First `<fs>:` token of a directory listing: `Directory of flash:/`
pub static RE_FILE_SYSTEM: LazyLock<Regex> = LazyLock::new(|| compile(r"^\s*.*?(\S+:)"));

// Redundancy

/// Splits `show redundancy` into general info, local and peer segments.
pub static RE_SHOW_REDUNDANCY: LazyLock<Regex> = LazyLock::new(|| {
    compile(concat!(
        r"(?s)\A\s*Redundant\s+System\s+Information\s*:\s*\n-+[ \t]*\n(?P<info>.+?)",
        r"\n\s*(?:Current|Red\w*)\s+Processor\s+Information\s*:[^\n]*\n-+[ \t]*\n(?P<local>.+?)",
        r"(?:\n\s*Peer\s+Processor\s+Information\s*:[^\n]*\n-+[ \t]*\n(?P<peer>.+?)\s*\z|\s*\z)",
    ))
});

pub static RE_REDUNDANCY_OPERATION_MODE: LazyLock<Regex> =
    LazyLock::new(|| compile(r"(?m)^\s*Operating\s+Redundancy\s+Mode\s*=\s*(.+?)\s*$"));

pub static RE_REDUNDANCY_STATE: LazyLock<Regex> =
    LazyLock::new(|| compile(r"(?m)^\s*Current\s+Software\s+state\s*=\s*(.+?)\s*$"));

#[cfg(test)]
mod tests {
    use super::*;

    const REDUNDANCY: &str = include_str!("../../../../tests/fixtures/cisco_ios/show_redundancy.txt");
    const REDUNDANCY_NO_PEER: &str =
        include_str!("../../../../tests/fixtures/cisco_ios/show_redundancy_no_peer.txt");

    #[test]
    fn test_re_show_redundancy_segments() {
        let caps = RE_SHOW_REDUNDANCY.captures(REDUNDANCY).unwrap();
        assert!(caps["info"].contains("Operating Redundancy Mode = Stateful Switchover"));
        assert!(caps["local"].contains("Current Software state = ACTIVE"));
        assert!(caps["peer"].contains("Current Software state = STANDBY HOT"));
        assert!(!caps["local"].contains("STANDBY HOT"));
    }

    #[test]
    fn test_re_show_redundancy_no_peer() {
        let caps = RE_SHOW_REDUNDANCY.captures(REDUNDANCY_NO_PEER).unwrap();
        assert!(caps["local"].contains("Current Software state = ACTIVE"));
        assert!(caps.name("peer").is_none());
    }

    #[test]
    fn test_re_redundancy_operation_mode() {
        let caps = RE_SHOW_REDUNDANCY.captures(REDUNDANCY).unwrap();
        let mode = RE_REDUNDANCY_OPERATION_MODE.captures(&caps["info"]).unwrap();
        assert_eq!(&mode[1], "Stateful Switchover");
    }

    #[test]
    fn test_re_redundancy_state() {
        let caps = RE_REDUNDANCY_STATE
            .captures("a\n  Current Software state = ACTIVE \n  b")
            .unwrap();
        assert_eq!(&caps[1], "ACTIVE");

        let caps = RE_REDUNDANCY_STATE
            .captures("a\n  Current Software state = STANDBY HOT \n  b")
            .unwrap();
        assert_eq!(&caps[1], "STANDBY HOT");
    }

    #[test]
    fn test_re_boot_system() {
        let caps = RE_BOOT_SYSTEM.captures("boot-start-marker\nboot system flash:/c2800nm.bin\nboot-end-marker").unwrap();
        assert_eq!(&caps[1], "flash:/c2800nm.bin");

        let caps = RE_BOOT_SYSTEM.captures("boot system flash c2800nm.bin\n").unwrap();
        assert_eq!(&caps[1], "c2800nm.bin");
    }

    #[test]
    fn test_re_file_system() {
        let caps = RE_FILE_SYSTEM.captures("Directory of bootflash:/\n\n  1  -rw-  x").unwrap();
        assert_eq!(&caps[1], "bootflash:");
    }
}
