use crate::reg::{Register, RegisterFile, Width};

#[test]
fn byte_store_truncates() {
    let mut reg = Register::new(Width::Byte);

    reg.set(0x1FF);

    assert_eq!(0xFF, reg.get());
}

#[test]
fn word_store_keeps_all_bits() {
    let mut reg = Register::new(Width::Word);

    reg.set(0xBEEF);

    assert_eq!(0xBEEF, reg.get());
}

#[test]
fn byte_combine_truncates() {
    let mut reg = Register::new(Width::Byte);

    reg.set(0xFF);
    reg.add(2);

    assert_eq!(0x01, reg.get());
}

#[test]
fn word_add_wraps() {
    let mut reg = Register::new(Width::Word);

    reg.set(0xFFFF);
    reg.add(1);

    assert_eq!(0x0000, reg.get());
}

#[test]
fn bitwise_combines_respect_width() {
    let mut reg = Register::new(Width::Byte);

    reg.set(0x0F);
    reg.or(0xF0);
    assert_eq!(0xFF, reg.get());

    reg.xor(0x180);
    assert_eq!(0x7F, reg.get());

    reg.and(0x131);
    assert_eq!(0x31, reg.get());

    reg.sub(0x32);
    assert_eq!(0xFF, reg.get());
}

#[test]
fn lr_aliases_bank_zero() {
    let mut file = RegisterFile::new();

    file.set_lr(0x1234);
    assert_eq!(0x1234, file.elr[0].get());

    file.elr[0].set(0x4321);
    assert_eq!(0x4321, file.lr());
}

#[test]
fn psw_aliases_bank_zero() {
    let mut file = RegisterFile::new();

    file.set_psw(0xA5);
    assert_eq!(0xA5, file.epsw[0].get() as u8);

    file.epsw[0].set(0x5A);
    assert_eq!(0x5A, file.psw());
}

#[test]
fn lcsr_aliases_bank_zero() {
    let mut file = RegisterFile::new();

    file.set_lcsr(0x000F);
    assert_eq!(0x000F, file.ecsr[0].get());
}

#[test]
fn gp_gather_is_little_endian() {
    let mut file = RegisterFile::new();

    file.r[2].set(0x34);
    file.r[3].set(0x12);

    assert_eq!(0x1234, file.read_gp(2, 2));
}

#[test]
fn gp_scatter_roundtrips() {
    let mut file = RegisterFile::new();

    file.write_gp(4, 4, 0xDEAD_BEEF);

    assert_eq!(0xEF, file.r[4].get());
    assert_eq!(0xBE, file.r[5].get());
    assert_eq!(0xAD, file.r[6].get());
    assert_eq!(0xDE, file.r[7].get());
    assert_eq!(0xDEAD_BEEF, file.read_gp(4, 4));
}

#[test]
fn gp_gather_wraps_at_file_end() {
    let mut file = RegisterFile::new();

    file.r[15].set(0x11);
    file.r[0].set(0x22);

    assert_eq!(0x2211, file.read_gp(15, 2));
}

#[test]
fn reset_zeroes_everything() {
    let mut file = RegisterFile::new();

    file.r[7].set(0x77);
    file.sp.set(0x8000);
    file.set_psw(0xFF);
    file.reset();

    assert_eq!(0, file.r[7].get());
    assert_eq!(0, file.sp.get());
    assert_eq!(0, file.psw());
}
