//! Debug helpers for dumping raw heap bytes during development.

/// Format a raw address the way the rest of the crate's debug output does.
pub fn format_address(address: usize) -> String {
    format!("0x{:016X}", address)
}

/// Hex-dump `lines` 16-byte rows starting at `start`, stopping early if
/// `size` bytes are exhausted. `start` must point at a valid, readable
/// region of at least `size` bytes — callers are expected to pass the
/// bounds of a region they own.
///
/// # Safety
/// `start..start+size` must be a valid, initialized, readable range.
pub unsafe fn dump_region(start: usize, size: usize, lines: usize) {
    println!("memory dump at {}:", format_address(start));
    for i in 0..lines {
        let offset = i * 16;
        if offset >= size {
            break;
        }
        let addr = start + offset;
        print!("  {}: ", format_address(addr));
        for j in 0..16 {
            if offset + j >= size {
                break;
            }
            let byte = unsafe { *((addr + j) as *const u8) };
            print!("{:02X} ", byte);
        }
        println!();
    }
}
