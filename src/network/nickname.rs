use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Static short-name registry, consulted only by `/balance`. The node
/// behaves identically when the table is empty; entries are a deployment
/// convenience agreed out of band.
static NICKNAMES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    let table: &[(&str, &str)] = &[];
    table.iter().copied().collect()
});

/// Map a nickname to its address; anything unknown (including a plain
/// address) is returned unchanged.
pub fn resolve_address(name_or_addr: &str) -> String {
    resolve_in(&NICKNAMES, name_or_addr)
}

/// Render an address for humans: `name (abcd1234...wxyz)` when a nickname
/// exists, the bare address otherwise.
pub fn display_name(addr: &str) -> String {
    display_in(&NICKNAMES, addr)
}

fn resolve_in(table: &HashMap<&str, &str>, name_or_addr: &str) -> String {
    match table.get(name_or_addr) {
        Some(addr) => (*addr).to_string(),
        None => name_or_addr.to_string(),
    }
}

fn display_in(table: &HashMap<&str, &str>, addr: &str) -> String {
    for (name, known) in table {
        if *known == addr {
            if addr.len() > 10 {
                let short = format!("{}...{}", &addr[..8], &addr[addr.len() - 4..]);
                return format!("{name} ({short})");
            }
            return format!("{name} ({addr})");
        }
    }
    addr.to_string()
}
