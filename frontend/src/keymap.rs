use sdl2::keyboard::Keycode;

/// # Keymap
/// Chip-8 input is generated with a hexadecimal keypad.
///
/// The keypad is laid over the left 4 alphanumeric columns, row for row.
/// ```text
/// |1|2|3|C|      |1|2|3|4|
/// |4|5|6|D|  ->  |Q|W|E|R|
/// |7|8|9|E|  ->  |A|S|D|F|
/// |A|0|B|F|      |Z|X|C|V|
/// ```
#[rustfmt::skip]
const LAYOUT: [[(Keycode, u8); 4]; 4] = [
    [(Keycode::Num1, 0x1), (Keycode::Num2, 0x2), (Keycode::Num3, 0x3), (Keycode::Num4, 0xC)],
    [(Keycode::Q, 0x4),    (Keycode::W, 0x5),    (Keycode::E, 0x6),    (Keycode::R, 0xD)],
    [(Keycode::A, 0x7),    (Keycode::S, 0x8),    (Keycode::D, 0x9),    (Keycode::F, 0xE)],
    [(Keycode::Z, 0xA),    (Keycode::X, 0x0),    (Keycode::C, 0xB),    (Keycode::V, 0xF)],
];

/// The keypad key a host key stands for
pub fn keymap(key: Keycode) -> Option<u8> {
    LAYOUT
        .iter()
        .flatten()
        .find(|(host, _)| *host == key)
        .map(|(_, value)| *value)
}

#[cfg(test)]
mod test_keymap {
    use super::*;

    const ROWS: [[Keycode; 4]; 4] = [
        [Keycode::Num1, Keycode::Num2, Keycode::Num3, Keycode::Num4],
        [Keycode::Q, Keycode::W, Keycode::E, Keycode::R],
        [Keycode::A, Keycode::S, Keycode::D, Keycode::F],
        [Keycode::Z, Keycode::X, Keycode::C, Keycode::V],
    ];

    #[test]
    fn test_keymap_follows_keypad_layout() {
        let keypad = [
            [0x1, 0x2, 0x3, 0xC],
            [0x4, 0x5, 0x6, 0xD],
            [0x7, 0x8, 0x9, 0xE],
            [0xA, 0x0, 0xB, 0xF],
        ];
        for (keys, expected) in ROWS.iter().zip(keypad.iter()) {
            for (key, value) in keys.iter().zip(expected.iter()) {
                assert_eq!(keymap(*key), Some(*value), "{:?}", key);
            }
        }
    }

    #[test]
    fn test_keymap_covers_every_key_once() {
        let mut seen = [false; 16];
        for key in ROWS.iter().flatten() {
            let value = usize::from(keymap(*key).unwrap());
            assert!(!seen[value], "{:#X} mapped twice", value);
            seen[value] = true;
        }
        assert!(seen.iter().all(|s| *s));
    }

    #[test]
    fn test_keymap_ignores_other_keys() {
        assert_eq!(keymap(Keycode::Escape), None);
        assert_eq!(keymap(Keycode::Num5), None);
        assert_eq!(keymap(Keycode::Space), None);
    }
}
