use core::fmt;

use flat_device_tree::Fdt;

/// Dumps every node and property of the tree in `blob` to the log.
pub fn print_tree(blob: &[u8]) {
    if let Err(err) = write_tree(blob, |line| log::info!("{}", line)) {
        log::warn!("cannot print device tree: {:?}", err);
    }
}

/// Renders the tree in `blob`, one `emit` call per line.
fn write_tree(
    blob: &[u8],
    mut emit: impl FnMut(fmt::Arguments<'_>),
) -> Result<(), impl fmt::Debug> {
    let fdt = match Fdt::new(blob) {
        Ok(fdt) => fdt,
        Err(err) => return Err(err),
    };
    emit(format_args!(
        "device tree at {:p}, {} bytes",
        blob.as_ptr(),
        fdt.total_size()
    ));
    for node in fdt.all_nodes() {
        emit(format_args!("{}", node.name));
        for prop in node.properties() {
            match printable(prop.value) {
                Some(text) => emit(format_args!("    {} = \"{}\"", prop.name, text)),
                None => emit(format_args!("    {} = {:02x?}", prop.name, prop.value)),
            }
        }
    }
    Ok(())
}

/// The value as text when it is a non-empty NUL-terminated string list.
fn printable(value: &[u8]) -> Option<&str> {
    let text = value.strip_suffix(&[0u8])?;
    if text.is_empty() || text.starts_with(&[0]) {
        return None;
    }
    let text = core::str::from_utf8(text).ok()?;
    text.chars()
        .all(|c| c == '\0' || c.is_ascii_graphic() || c == ' ')
        .then_some(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::FdtBuilder;

    #[test]
    fn text_detection() {
        assert_eq!(printable(b"ns16550a\0"), Some("ns16550a"));
        assert_eq!(printable(b"a\0b\0"), Some("a\0b"));
        assert_eq!(printable(&[0, 0, 0, 1]), None);
        assert_eq!(printable(b"\0"), None);
    }

    #[test]
    fn renders_nodes_and_properties() {
        let blob = FdtBuilder::new()
            .begin_node("")
            .prop_str("model", "virt")
            .begin_node("cpus")
            .prop_u32("#address-cells", 1)
            .end_node()
            .end_node()
            .finish();
        let mut lines = Vec::new();
        write_tree(&blob, |line| lines.push(line.to_string())).unwrap();

        assert!(lines[0].ends_with(&format!("{} bytes", blob.len())));
        let at = |line: &str| lines.iter().position(|l| l == line);
        let model = at("    model = \"virt\"").unwrap();
        let cpus = at("cpus").unwrap();
        let cells = at("    #address-cells = [00, 00, 00, 01]").unwrap();
        assert!(model < cpus && cpus < cells);
        assert_eq!(lines.len(), 5);
    }

    #[test]
    fn broken_tree_renders_nothing() {
        let blob = FdtBuilder::new().begin_node("").end_node().finish();
        let mut lines = Vec::new();
        assert!(write_tree(&blob[..16], |line| lines.push(line.to_string())).is_err());
        assert!(lines.is_empty());
        print_tree(&blob[..16]);
    }
}
