use chipotle8::{
    Cycle, Emulator, ExecError, Key, LoadError, Op, MAX_ROM_SIZE, MEMORY_SIZE,
    STARTING_MEMORY_BYTE,
};
use proptest::prelude::*;

const START: u16 = STARTING_MEMORY_BYTE as u16;

fn program(words: &[u16]) -> Vec<u8> {
    words.iter().flat_map(|w| w.to_be_bytes().to_vec()).collect()
}

proptest! {
    #[test]
    fn rom_lands_at_program_start(rom in prop::collection::vec(any::<u8>(), 0..=MAX_ROM_SIZE)) {
        let mut emulator = Emulator::new(None);
        let before = emulator.memory().as_slice().to_vec();

        emulator.load_rom(&rom).unwrap();

        let after = emulator.memory().as_slice();
        let end = STARTING_MEMORY_BYTE + rom.len();
        prop_assert_eq!(&after[STARTING_MEMORY_BYTE..end], &rom[..]);
        prop_assert_eq!(&after[..STARTING_MEMORY_BYTE], &before[..STARTING_MEMORY_BYTE]);
        prop_assert_eq!(&after[end..], &before[end..]);
    }

    #[test]
    fn oversized_rom_changes_nothing(extra in 1usize..512, fill in any::<u8>()) {
        let mut emulator = Emulator::new(None);
        emulator.load_rom(&[0xAA; 16]).unwrap();
        let before = emulator.memory().as_slice().to_vec();

        let rom = vec![fill; MAX_ROM_SIZE + extra];
        let result = emulator.load_rom(&rom);

        let is_too_large = matches!(result, Err(LoadError::RomTooLarge { .. }));
        prop_assert!(is_too_large);
        prop_assert_eq!(emulator.memory().as_slice(), &before[..]);
    }

    #[test]
    fn drawing_twice_restores_the_screen(
        x in any::<u8>(),
        y in any::<u8>(),
        sprite in prop::collection::vec(any::<u8>(), 1..=15),
    ) {
        let n = sprite.len() as u16;
        // V0 = x, V1 = y, I = 0x300, draw, draw
        let mut rom = program(&[0x6000 | x as u16, 0x6100 | y as u16, 0xA300, 0xD010 | n, 0xD010 | n]);
        rom.resize(0x100, 0);
        rom.extend_from_slice(&sprite);

        let mut emulator = Emulator::new(None);
        emulator.load_rom(&rom).unwrap();
        for _ in 0..4 {
            emulator.step().unwrap();
        }
        prop_assert_eq!(emulator.registers()[0xF], 0);

        emulator.step().unwrap();

        prop_assert!(emulator.graphics().is_blank());
        let any_lit = sprite.iter().any(|row| *row != 0);
        prop_assert_eq!(emulator.registers()[0xF], any_lit as u8);
    }

    #[test]
    fn add_with_carry(a in any::<u8>(), b in any::<u8>()) {
        let rom = program(&[0x6000 | a as u16, 0x6100 | b as u16, 0x8014]);
        let mut emulator = Emulator::new(None);
        emulator.load_rom(&rom).unwrap();
        for _ in 0..3 {
            emulator.step().unwrap();
        }

        let sum = a as u16 + b as u16;
        prop_assert_eq!(emulator.registers()[0], (sum & 0xFF) as u8);
        prop_assert_eq!(emulator.registers()[0xF], (sum > 0xFF) as u8);
    }

    #[test]
    fn subtract_flag_is_no_borrow(a in any::<u8>(), b in any::<u8>()) {
        let rom = program(&[0x6000 | a as u16, 0x6100 | b as u16, 0x8015]);
        let mut emulator = Emulator::new(None);
        emulator.load_rom(&rom).unwrap();
        for _ in 0..3 {
            emulator.step().unwrap();
        }

        prop_assert_eq!(emulator.registers()[0], a.wrapping_sub(b));
        prop_assert_eq!(emulator.registers()[0xF], (a >= b) as u8);
    }

    #[test]
    fn jump_only_moves_pc(half in 0u16..0x7FF) {
        let target = half * 2;
        let mut emulator = Emulator::new(None);
        emulator.load_rom(&program(&[0x1000 | target])).unwrap();
        let before = emulator.snapshot();

        prop_assert_eq!(emulator.step(), Ok(Cycle::Executed(Op::Goto(target))));

        let after = emulator.snapshot();
        prop_assert_eq!(after.pc, target);
        prop_assert_eq!(after.v, before.v);
        prop_assert_eq!(after.stack, before.stack);
        prop_assert_eq!(after.addr, before.addr);
    }

    #[test]
    fn skip_equal(vx in any::<u8>(), nn in any::<u8>()) {
        let rom = program(&[0x6000 | vx as u16, 0x3000 | nn as u16]);
        let mut emulator = Emulator::new(None);
        emulator.load_rom(&rom).unwrap();
        emulator.step().unwrap();

        emulator.step().unwrap();

        let expected = if vx == nn { START + 6 } else { START + 4 };
        prop_assert_eq!(emulator.pc(), expected);
    }

    #[test]
    fn stepping_never_leaves_pc_odd(rom in prop::collection::vec(any::<u8>(), 0..256)) {
        let mut emulator = Emulator::new(None);
        emulator.load_rom(&rom).unwrap();

        for _ in 0..64 {
            match emulator.step() {
                Err(ExecError::Halted) => break,
                _ => {
                    prop_assert_eq!(emulator.pc() % 2, 0);
                }
            }
            prop_assert!(emulator.stack_depth() <= 16);
            prop_assert!((emulator.pc() as usize) <= MEMORY_SIZE + 2);
        }
    }

    #[test]
    fn key_wait_completes_on_first_press(idle_steps in 0usize..20, key in 0usize..16) {
        let mut emulator = Emulator::new(None);
        emulator.load_rom(&program(&[0xF50A])).unwrap();

        for _ in 0..=idle_steps {
            prop_assert_eq!(emulator.step(), Ok(Cycle::AwaitingKey));
            prop_assert_eq!(emulator.pc(), START);
        }

        emulator.key_down(Key::from_index(key));

        prop_assert_eq!(emulator.step(), Ok(Cycle::Executed(Op::KeyOpGet(5))));
        prop_assert_eq!(emulator.registers()[5] as usize, key);
        prop_assert_eq!(emulator.pc(), START + 2);
    }
}

#[test]
fn call_then_return_restores_next_instruction() {
    // 0x202: call 700 (0x2BC); 700: return
    let mut rom = program(&[0x0000, 0x22BC]);
    rom.resize(700 - STARTING_MEMORY_BYTE, 0);
    rom.extend_from_slice(&[0x00, 0xEE]);

    let mut emulator = Emulator::new(None);
    emulator.load_rom(&rom).unwrap();
    emulator.step().unwrap_err();
    assert_eq!(emulator.pc(), 514);

    emulator.step().unwrap();
    assert_eq!(emulator.pc(), 700);
    emulator.step().unwrap();
    assert_eq!(emulator.pc(), 516);
}
