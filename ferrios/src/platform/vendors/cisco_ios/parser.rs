//! Cisco IOS output parser.

use indexmap::IndexMap;

use super::patterns::*;
use crate::error::ParseError;
use crate::parse::uptime::{uptime_seconds, uptime_string};
use crate::parse::{
    BootQuery, BootSource, RedundancyReport, RedundancyState, VendorParser, VersionFacts,
};

const BOOT_QUERIES: [BootQuery; 3] = [
    BootQuery {
        command: "show bootvar",
        source: BootSource::Variables,
    },
    BootQuery {
        command: "show boot",
        source: BootSource::Variables,
    },
    BootQuery {
        command: "show run | inc boot",
        source: BootSource::RunningConfig,
    },
];

/// [`VendorParser`] for Cisco IOS.
#[derive(Debug, Clone, Copy, Default)]
pub struct IosParser;

fn capture<'a>(re: &regex::Regex, text: &'a str) -> Option<&'a str> {
    re.captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

impl VendorParser for IosParser {
    fn version(&self, output: &str) -> Result<VersionFacts, ParseError> {
        let caps = RE_HOSTNAME_UPTIME
            .captures(output)
            .ok_or_else(|| ParseError::new("show version", "no uptime line"))?;
        let hostname = caps[1].to_string();
        let uptime = uptime_seconds(&caps[2])
            .ok_or_else(|| ParseError::new("show version", format!("bad uptime '{}'", &caps[2])))?;

        let os_version = capture(&RE_VERSION, output)
            .ok_or_else(|| ParseError::new("show version", "no version"))?
            .to_string();

        let mut extensions = IndexMap::new();
        if let Some(register) = capture(&RE_CONFIG_REGISTER, output) {
            extensions.insert("config_register".to_string(), register.to_string());
        }
        if let Some(image) = capture(&RE_SYSTEM_IMAGE, output) {
            extensions.insert("system_image".to_string(), image.to_string());
        }

        Ok(VersionFacts {
            hostname,
            os_version,
            model: capture(&RE_MODEL, output).unwrap_or_default().to_string(),
            serial_number: capture(&RE_SERIAL, output).unwrap_or_default().to_string(),
            uptime,
            uptime_string: uptime_string(uptime),
            extensions,
        })
    }

    fn interfaces(&self, output: &str) -> Vec<String> {
        RE_INTERFACE
            .captures_iter(output)
            .map(|caps| caps[1].to_string())
            .collect()
    }

    fn vlans(&self, output: &str) -> Vec<u16> {
        RE_VLAN
            .captures_iter(output)
            .filter_map(|caps| caps[1].parse().ok())
            .collect()
    }

    fn boot_queries(&self) -> &[BootQuery] {
        &BOOT_QUERIES
    }

    fn boot_path(&self, query: &BootQuery, output: &str) -> Option<String> {
        match query.source {
            BootSource::Variables => {
                let section = output
                    .split_once(BOOT_NEXT_RELOAD)
                    .map_or(output, |(_, next)| next);
                RE_BOOT_VARIABLE.captures(section).and_then(|caps| {
                    caps.get(1)
                        .or_else(|| caps.get(2))
                        .map(|m| m.as_str().to_string())
                })
            }
            BootSource::RunningConfig => {
                capture(&RE_BOOT_SYSTEM, output).map(str::to_string)
            }
        }
    }

    fn file_system(&self, output: &str) -> Option<String> {
        capture(&RE_FILE_SYSTEM, output).map(str::to_string)
    }

    fn redundancy(&self, output: &str) -> Result<RedundancyReport, ParseError> {
        let caps = RE_SHOW_REDUNDANCY
            .captures(output)
            .ok_or_else(|| ParseError::new("show redundancy", "unrecognized layout"))?;

        let mode = caps
            .name("info")
            .and_then(|info| capture(&RE_REDUNDANCY_OPERATION_MODE, info.as_str()))
            .map(str::to_lowercase);

        let local = caps
            .name("local")
            .and_then(|local| capture(&RE_REDUNDANCY_STATE, local.as_str()))
            .map(RedundancyState::from_reported)
            .ok_or_else(|| ParseError::new("show redundancy", "no software state"))?;

        let peer = caps
            .name("peer")
            .and_then(|peer| capture(&RE_REDUNDANCY_STATE, peer.as_str()))
            .map_or(RedundancyState::Disabled, RedundancyState::from_reported);

        Ok(RedundancyReport { mode, local, peer })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    macro_rules! fixture {
        ($name:literal) => {
            include_str!(concat!("../../../../tests/fixtures/cisco_ios/", $name, ".txt"))
        };
    }

    #[test]
    fn test_version_facts() {
        let facts = IosParser.version(fixture!("show_version")).unwrap();
        assert_eq!(facts.hostname, "rtr2811");
        assert_eq!(facts.os_version, "15.1(3)T4");
        assert_eq!(facts.model, "2811");
        assert_eq!(facts.serial_number, "FTX1000A0AA");
        assert_eq!(facts.uptime, 413_940);
        assert_eq!(facts.uptime_string, "04:18:59:00");
        assert_eq!(facts.extensions["config_register"], "0x2102");
        assert_eq!(
            facts.extensions["system_image"],
            "flash:c2800nm-adventerprisek9-mz.151-3.T4.bin"
        );
    }

    #[test]
    fn test_version_without_uptime_is_error() {
        let err = IosParser.version("Cisco IOS Software, Version 15.1(3)T4").unwrap_err();
        assert_eq!(err.target, "show version");
    }

    #[test]
    fn test_interfaces_in_order() {
        let interfaces = IosParser.interfaces(fixture!("show_interfaces"));
        assert_eq!(
            interfaces,
            ["FastEthernet0/0", "FastEthernet0/1", "Serial0/0/0", "Loopback0"]
        );
    }

    #[test]
    fn test_vlans() {
        let vlans = IosParser.vlans(fixture!("show_vlan"));
        assert_eq!(vlans, [1, 10, 20, 1002, 1003, 1004, 1005]);
    }

    #[test]
    fn test_boot_queries_order() {
        let commands: Vec<_> = IosParser.boot_queries().iter().map(|q| q.command).collect();
        assert_eq!(commands, ["show bootvar", "show boot", "show run | inc boot"]);
    }

    #[test]
    fn test_boot_path_bootvar_takes_next_reload() {
        let query = IosParser.boot_queries()[0];
        let path = IosParser.boot_path(&query, fixture!("show_bootvar"));
        assert_eq!(
            path.as_deref(),
            Some("bootflash:cat4500e-universalk9.SPA.03.08.02.E.152-4.E2.bin,12;")
        );
    }

    #[test]
    fn test_boot_path_show_boot_path_list() {
        let query = IosParser.boot_queries()[1];
        let path = IosParser.boot_path(&query, fixture!("show_boot"));
        assert_eq!(path.as_deref(), Some("flash:/c3560-ipservicesk9-mz.122-55.SE10.bin"));
    }

    #[test]
    fn test_boot_path_running_config() {
        let query = IosParser.boot_queries()[2];
        let path = IosParser.boot_path(&query, fixture!("show_run_inc_boot"));
        assert_eq!(path.as_deref(), Some("c2800nm-adventerprisek9-mz.151-3.T4.bin"));
    }

    #[test]
    fn test_boot_path_empty_variable() {
        let query = IosParser.boot_queries()[0];
        assert_eq!(IosParser.boot_path(&query, "BOOT variable = \nCONFIG_FILE variable = "), None);
    }

    #[test]
    fn test_file_system() {
        assert_eq!(
            IosParser.file_system(fixture!("dir")).as_deref(),
            Some("flash:")
        );
        assert_eq!(IosParser.file_system(""), None);
    }

    #[test]
    fn test_redundancy_report() {
        let report = IosParser.redundancy(fixture!("show_redundancy")).unwrap();
        assert_eq!(report.mode.as_deref(), Some("stateful switchover"));
        assert_eq!(report.local, RedundancyState::Active);
        assert_eq!(report.peer, RedundancyState::StandbyHot);
    }

    #[test]
    fn test_redundancy_report_standby() {
        let report = IosParser.redundancy(fixture!("show_redundancy_standby")).unwrap();
        assert_eq!(report.local, RedundancyState::StandbyHot);
        assert_eq!(report.peer, RedundancyState::Active);
    }

    #[test]
    fn test_redundancy_report_no_peer() {
        let report = IosParser.redundancy(fixture!("show_redundancy_no_peer")).unwrap();
        assert_eq!(report.local, RedundancyState::Active);
        assert_eq!(report.peer, RedundancyState::Disabled);
    }

    #[test]
    fn test_image_booted() {
        let version = fixture!("show_version");
        assert!(IosParser.image_booted(version, "c2800nm-adventerprisek9-mz.151-3.T4.bin"));
        assert!(!IosParser.image_booted(version, "c2800nm-adventerprisek9-mz.151-4.M.bin"));
        assert!(!IosParser.image_booted(version, ""));
    }
}
