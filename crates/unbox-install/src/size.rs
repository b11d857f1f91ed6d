const KIB: u64 = 1024;
const MIB: u64 = 1024 * KIB;
const GIB: u64 = 1024 * MIB;
const TIB: u64 = 1024 * GIB;
const PIB: u64 = 1024 * TIB;

/// Human readable byte count with binary prefixes.
///
/// Plain bytes are printed as an integer, everything from 1 KiB up with two
/// decimals of the largest unit the value reaches.
///
/// # Examples
/// ```
/// use unbox_install::format_size;
///
/// assert_eq!(format_size(0), "0 B");
/// assert_eq!(format_size(2000), "1.95 KiB");
/// assert_eq!(format_size(5_242_880), "5.00 MiB");
/// ```
pub fn format_size(bytes: u64) -> String {
    let (unit, name) = match bytes {
        b if b < KIB => return format!("{b} B"),
        b if b < MIB => (KIB, "KiB"),
        b if b < GIB => (MIB, "MiB"),
        b if b < TIB => (GIB, "GiB"),
        b if b < PIB => (TIB, "TiB"),
        _ => (PIB, "PiB"),
    };
    format!("{:.2} {}", bytes as f64 / unit as f64, name)
}
