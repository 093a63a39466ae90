//! Boot image path normalization.

/// Reduce a raw boot path to the bare image name.
///
/// Drops everything after the first `,` or `;` (IOS appends a boot
/// sequence number and a separator), then the file-system prefix (or any
/// `<fs>:` prefix), then leading slashes.
pub fn normalize_boot_image(path: &str, file_system: &str) -> String {
    let path = path.split([',', ';']).next().unwrap_or(path).trim();

    let path = match path.strip_prefix(file_system) {
        Some(rest) if !file_system.is_empty() => rest,
        _ => path.split_once(':').map_or(path, |(_, rest)| rest),
    };

    path.trim_start_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_file_system() {
        assert_eq!(normalize_boot_image("flash:/c2800nm.bin", "flash:"), "c2800nm.bin");
        assert_eq!(normalize_boot_image("flash:c2800nm.bin", "flash:"), "c2800nm.bin");
    }

    #[test]
    fn test_strips_other_file_system() {
        assert_eq!(normalize_boot_image("bootflash:IMAGE.bin", "flash:"), "IMAGE.bin");
    }

    #[test]
    fn test_strips_sequence_suffix() {
        assert_eq!(
            normalize_boot_image("bootflash:cat4500e.bin,12;", "bootflash:"),
            "cat4500e.bin"
        );
        assert_eq!(normalize_boot_image("flash:a.bin;flash:b.bin", "flash:"), "a.bin");
    }

    #[test]
    fn test_bare_name() {
        assert_eq!(normalize_boot_image("image.bin", "flash:"), "image.bin");
    }
}
