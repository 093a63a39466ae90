//! Cisco IOS platform definition.
//!
//! Privilege levels:
//! - `exec` - User EXEC mode with `>` prompt
//! - `privilege_exec` - Privileged EXEC mode with `#` prompt
//! - `configuration` - Configuration mode with `(config*)#` prompt
//!
//! # Prompt Examples
//!
//! ```text
//! rtr2811>                           # exec mode
//! rtr2811#                           # privilege_exec mode
//! rtr2811(config)#                   # configuration mode
//! rtr2811(config-if)#                # config sub-mode (interface)
//! ```
//!
//! # Privilege Graph
//!
//! ```text
//! ┌──────┐  enable     ┌────────────────┐  configure terminal  ┌───────────────┐
//! │ exec ├──────────────► privilege_exec ├──────────────────────► configuration │
//! │  >   │   disable   │       #        │        end           │  (config*)#   │
//! └──────┘◄────────────┴────────────────┘◄─────────────────────┴───────────────┘
//! ```

use std::sync::Arc;

use super::IosParser;
use crate::platform::{PlatformDefinition, PrivilegeLevel};

/// Create the Cisco IOS platform definition.
pub fn platform() -> PlatformDefinition {
    let exec = PrivilegeLevel::new("exec", r"(?mi)^[\w.\-@()/: ]{1,63}>\s?$").unwrap();

    // "#" also ends configuration prompts
    let privilege_exec = PrivilegeLevel::new("privilege_exec", r"(?mi)^[\w.\-@()/: ]{1,63}#\s?$")
        .unwrap()
        .with_parent("exec")
        .with_escalate("enable")
        .with_deescalate("disable")
        .with_auth(r"(?mi)^password:\s?$")
        .unwrap()
        .with_not_contains("(config");

    let configuration = PrivilegeLevel::new(
        "configuration",
        r"(?mi)^[\w.\-@()/: ]{1,63}\(config[\w.\-@/:+]{0,63}\)#\s?$",
    )
    .unwrap()
    .with_parent("privilege_exec")
    .with_escalate("configure terminal")
    .with_deescalate("end");

    PlatformDefinition::new("cisco_ios", "cisco", Arc::new(IosParser))
        .with_privilege(exec)
        .with_privilege(privilege_exec)
        .with_privilege(configuration)
        .with_default_privilege("privilege_exec")
        .with_config_privilege("configuration")
        // "% Invalid input", "%Error opening ..."; not syslog "%SYS-5-..."
        .with_error_signature(r"(?m)^\s*%(?:\s|Error)")
        .unwrap()
        .with_error_signature(r"Error:")
        .unwrap()
        .with_on_open_command("terminal length 0")
        .with_on_open_command("terminal width 511")
        .with_terminal_size(511, 24)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cisco_ios_platform() {
        let platform = platform();
        assert_eq!(platform.name, "cisco_ios");
        assert_eq!(platform.vendor, "cisco");
        assert_eq!(platform.privilege_levels.len(), 3);
        assert_eq!(platform.default_privilege, "privilege_exec");
    }

    #[test]
    fn test_determine_privilege() {
        let platform = platform();
        let name = |prompt: &str| platform.determine_privilege(prompt).map(|l| l.name.clone());

        assert_eq!(name("rtr2811>").as_deref(), Some("exec"));
        assert_eq!(name("rtr2811#").as_deref(), Some("privilege_exec"));
        assert_eq!(name("rtr2811(config)#").as_deref(), Some("configuration"));
        assert_eq!(name("rtr2811(config-if)#").as_deref(), Some("configuration"));
        assert_eq!(name("Password:"), None);
    }

    #[test]
    fn test_prompt_pattern_matches_every_level() {
        let pattern = platform().prompt_pattern().unwrap();
        assert!(pattern.is_match(b"output\r\nrtr2811>"));
        assert!(pattern.is_match(b"output\r\nrtr2811#"));
        assert!(pattern.is_match(b"output\r\nrtr2811(config)#"));
        assert!(!pattern.is_match(b"Proceed with reload? [confirm]"));
    }

    #[test]
    fn test_detect_failure() {
        let platform = platform();
        let output = "          ^\n% Invalid input detected at '^' marker.";
        assert_eq!(
            platform.detect_failure(output).as_deref(),
            Some("% Invalid input detected at '^' marker.")
        );
        assert!(platform.detect_failure("%Error opening flash:x (No such file)").is_some());
        assert!(platform.detect_failure("Error: not permitted").is_some());
        assert!(platform.detect_failure("Building configuration...\n[OK]").is_none());
    }

    #[test]
    fn test_syslog_messages_are_not_failures() {
        let platform = platform();
        let output = "Building configuration...\n\
                      %SYS-5-CONFIG_I: Configured from console by admin on vty0\n\
                      %LINK-3-UPDOWN: Interface FastEthernet0/1, changed state to up\n\
                      [OK]";
        assert!(platform.detect_failure(output).is_none());
        assert!(platform.detect_failure("% Incomplete command.").is_some());
    }

    #[test]
    fn test_transitions_escalate_from_exec() {
        let platform = platform();
        let steps = platform.transitions("exec", "configuration").unwrap();
        let commands: Vec<_> = steps.iter().map(|s| s.command.as_str()).collect();
        assert_eq!(commands, ["enable", "configure terminal"]);
        assert!(steps[0].auth_prompt.is_some());
        assert_eq!(steps[1].target, "configuration");
    }

    #[test]
    fn test_transitions_deescalate_from_config() {
        let platform = platform();
        let steps = platform.transitions("configuration", "privilege_exec").unwrap();
        assert_eq!(steps.len(), 1);
        assert_eq!(steps[0].command, "end");
        assert_eq!(steps[0].target, "privilege_exec");
        assert!(platform.transitions("privilege_exec", "privilege_exec").unwrap().is_empty());
        assert!(platform.transitions("exec", "shell").is_none());
    }
}
