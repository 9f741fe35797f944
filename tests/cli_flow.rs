use std::fs;

use soft_mmu::io::{read_virtual_addresses, write_results};
use soft_mmu::{Fault, Mmu, MmuConfig};

fn scratch(name: &str) -> std::path::PathBuf {
    let dir = std::env::temp_dir().join(format!("soft-mmu-{}-{}", name, std::process::id()));
    fs::create_dir_all(&dir).unwrap();
    dir
}

#[test]
fn test_config_file_to_batch_output() {
    let dir = scratch("batch");
    let config_path = dir.join("mmu.toml");
    let input_path = dir.join("input.txt");
    let output_path = dir.join("output.txt");

    fs::write(&config_path, "address_space_bits = 32\npage_bytes = 4096\n").unwrap();
    fs::write(&input_path, "2000 1000\n0 80000000\n-1\n4000\n").unwrap();

    let config = MmuConfig::from_file(&config_path).unwrap();
    let mmu = Mmu::new(config).unwrap();
    assert_eq!(mmu.table().len(), 1 << 20);

    let vas = read_virtual_addresses(&input_path).unwrap();
    assert_eq!(vas, vec![0x2000, 0x1000, 0x0, 0x8000_0000]);

    let results = mmu.translate_batch(&vas);
    write_results(&output_path, &results).unwrap();

    let written = fs::read_to_string(&output_path).unwrap();
    assert_eq!(written, "0x4000\n0x2000\n-1\n-1\n");

    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_every_address_gets_one_outcome() {
    let mmu = Mmu::new(MmuConfig::new(6, 4).unwrap()).unwrap();
    // 16 entries; cover every VPN and one past the end
    let vas: Vec<u32> = (0..=16u32).map(|vpn| (vpn << 2) | 1).collect();
    let results = mmu.translate_batch(&vas);

    let mut ok = 0;
    let mut not_valid = 0;
    let mut not_accessible = 0;
    let mut out_of_range = 0;
    for r in &results {
        match r.outcome {
            Ok(_) => ok += 1,
            Err(Fault::NotValid) => not_valid += 1,
            Err(Fault::NotAccessible) => not_accessible += 1,
            Err(Fault::OutOfRange) => out_of_range += 1,
        }
    }
    // VPNs 0..8 mapped, of which 0 and 4 inaccessible
    assert_eq!(ok, 6);
    assert_eq!(not_accessible, 2);
    assert_eq!(not_valid, 8);
    assert_eq!(out_of_range, 1);
}

#[test]
fn test_invalid_configuration_builds_nothing() {
    assert!(MmuConfig::new(0, 4096).is_err());
    assert!(MmuConfig::new(32, 100).is_err());
    assert!(MmuConfig::from_toml_str("address_space_bits = 32\npage_bytes = 0\n").is_err());
}
