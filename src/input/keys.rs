//! Symbolic key names and keyboard lookup tables
//!
//! Keyboard codes follow the FBK numbering (PC set-1 scan codes, extended keys
//! at `0x80 | code`). Configuration files refer to keys by their `FBK_*` name.

/// Frequently used key codes
pub mod fbk {
    pub const ESCAPE: u8 = 0x01;
    pub const KEY_1: u8 = 0x02;
    pub const KEY_2: u8 = 0x03;
    pub const KEY_5: u8 = 0x06;
    pub const KEY_6: u8 = 0x07;
    pub const A: u8 = 0x1E;
    pub const S: u8 = 0x1F;
    pub const D: u8 = 0x20;
    pub const Z: u8 = 0x2C;
    pub const X: u8 = 0x2D;
    pub const C: u8 = 0x2E;
    pub const V: u8 = 0x2F;
    pub const SPACE: u8 = 0x39;
    pub const F1: u8 = 0x3B;
    pub const F12: u8 = 0x58;
    pub const UPARROW: u8 = 0xC8;
    pub const LEFTARROW: u8 = 0xCB;
    pub const RIGHTARROW: u8 = 0xCD;
    pub const DOWNARROW: u8 = 0xD0;
}

/// Published name table, sorted by code
const KEY_NAMES: &[(u8, &str)] = &[
    (0x01, "FBK_ESCAPE"),
    (0x02, "FBK_1"),
    (0x03, "FBK_2"),
    (0x04, "FBK_3"),
    (0x05, "FBK_4"),
    (0x06, "FBK_5"),
    (0x07, "FBK_6"),
    (0x08, "FBK_7"),
    (0x09, "FBK_8"),
    (0x0A, "FBK_9"),
    (0x0B, "FBK_0"),
    (0x0C, "FBK_MINUS"),
    (0x0D, "FBK_EQUALS"),
    (0x0E, "FBK_BACK"),
    (0x0F, "FBK_TAB"),
    (0x10, "FBK_Q"),
    (0x11, "FBK_W"),
    (0x12, "FBK_E"),
    (0x13, "FBK_R"),
    (0x14, "FBK_T"),
    (0x15, "FBK_Y"),
    (0x16, "FBK_U"),
    (0x17, "FBK_I"),
    (0x18, "FBK_O"),
    (0x19, "FBK_P"),
    (0x1A, "FBK_LBRACKET"),
    (0x1B, "FBK_RBRACKET"),
    (0x1C, "FBK_RETURN"),
    (0x1D, "FBK_LCONTROL"),
    (0x1E, "FBK_A"),
    (0x1F, "FBK_S"),
    (0x20, "FBK_D"),
    (0x21, "FBK_F"),
    (0x22, "FBK_G"),
    (0x23, "FBK_H"),
    (0x24, "FBK_J"),
    (0x25, "FBK_K"),
    (0x26, "FBK_L"),
    (0x27, "FBK_SEMICOLON"),
    (0x28, "FBK_APOSTROPHE"),
    (0x29, "FBK_GRAVE"),
    (0x2A, "FBK_LSHIFT"),
    (0x2B, "FBK_BACKSLASH"),
    (0x2C, "FBK_Z"),
    (0x2D, "FBK_X"),
    (0x2E, "FBK_C"),
    (0x2F, "FBK_V"),
    (0x30, "FBK_B"),
    (0x31, "FBK_N"),
    (0x32, "FBK_M"),
    (0x33, "FBK_COMMA"),
    (0x34, "FBK_PERIOD"),
    (0x35, "FBK_SLASH"),
    (0x36, "FBK_RSHIFT"),
    (0x37, "FBK_MULTIPLY"),
    (0x38, "FBK_LALT"),
    (0x39, "FBK_SPACE"),
    (0x3A, "FBK_CAPITAL"),
    (0x3B, "FBK_F1"),
    (0x3C, "FBK_F2"),
    (0x3D, "FBK_F3"),
    (0x3E, "FBK_F4"),
    (0x3F, "FBK_F5"),
    (0x40, "FBK_F6"),
    (0x41, "FBK_F7"),
    (0x42, "FBK_F8"),
    (0x43, "FBK_F9"),
    (0x44, "FBK_F10"),
    (0x45, "FBK_NUMLOCK"),
    (0x46, "FBK_SCROLL"),
    (0x47, "FBK_NUMPAD7"),
    (0x48, "FBK_NUMPAD8"),
    (0x49, "FBK_NUMPAD9"),
    (0x4A, "FBK_SUBTRACT"),
    (0x4B, "FBK_NUMPAD4"),
    (0x4C, "FBK_NUMPAD5"),
    (0x4D, "FBK_NUMPAD6"),
    (0x4E, "FBK_ADD"),
    (0x4F, "FBK_NUMPAD1"),
    (0x50, "FBK_NUMPAD2"),
    (0x51, "FBK_NUMPAD3"),
    (0x52, "FBK_NUMPAD0"),
    (0x53, "FBK_DECIMAL"),
    (0x56, "FBK_OEM_102"),
    (0x57, "FBK_F11"),
    (0x58, "FBK_F12"),
    (0x64, "FBK_F13"),
    (0x65, "FBK_F14"),
    (0x66, "FBK_F15"),
    (0x70, "FBK_KANA"),
    (0x73, "FBK_ABNT_C1"),
    (0x79, "FBK_CONVERT"),
    (0x7B, "FBK_NOCONVERT"),
    (0x7D, "FBK_YEN"),
    (0x7E, "FBK_ABNT_C2"),
    (0x8D, "FBK_NUMPADEQUALS"),
    (0x90, "FBK_PREVTRACK"),
    (0x91, "FBK_AT"),
    (0x92, "FBK_COLON"),
    (0x93, "FBK_UNDERLINE"),
    (0x94, "FBK_KANJI"),
    (0x95, "FBK_STOP"),
    (0x96, "FBK_AX"),
    (0x97, "FBK_UNLABELED"),
    (0x99, "FBK_NEXTTRACK"),
    (0x9C, "FBK_NUMPADENTER"),
    (0x9D, "FBK_RCONTROL"),
    (0xA0, "FBK_MUTE"),
    (0xA1, "FBK_CALCULATOR"),
    (0xA2, "FBK_PLAYPAUSE"),
    (0xA4, "FBK_MEDIASTOP"),
    (0xAE, "FBK_VOLUMEDOWN"),
    (0xB0, "FBK_VOLUMEUP"),
    (0xB2, "FBK_WEBHOME"),
    (0xB3, "FBK_NUMPADCOMMA"),
    (0xB5, "FBK_DIVIDE"),
    (0xB7, "FBK_SYSRQ"),
    (0xB8, "FBK_RALT"),
    (0xC5, "FBK_PAUSE"),
    (0xC7, "FBK_HOME"),
    (0xC8, "FBK_UPARROW"),
    (0xC9, "FBK_PRIOR"),
    (0xCB, "FBK_LEFTARROW"),
    (0xCD, "FBK_RIGHTARROW"),
    (0xCF, "FBK_END"),
    (0xD0, "FBK_DOWNARROW"),
    (0xD1, "FBK_NEXT"),
    (0xD2, "FBK_INSERT"),
    (0xD3, "FBK_DELETE"),
    (0xDB, "FBK_LWIN"),
    (0xDC, "FBK_RWIN"),
    (0xDD, "FBK_APPS"),
    (0xDE, "FBK_POWER"),
    (0xDF, "FBK_SLEEP"),
    (0xE3, "FBK_WAKE"),
    (0xE5, "FBK_WEBSEARCH"),
    (0xE6, "FBK_WEBFAVORITES"),
    (0xE7, "FBK_WEBREFRESH"),
    (0xE8, "FBK_WEBSTOP"),
    (0xE9, "FBK_WEBFORWARD"),
    (0xEA, "FBK_WEBBACK"),
    (0xEB, "FBK_MYCOMPUTER"),
    (0xEC, "FBK_MAIL"),
    (0xED, "FBK_MEDIASELECT"),
];

/// Resolves an `FBK_*` name to its key code; empty or unknown names give `None`
pub fn find_key(name: &str) -> Option<u8> {
    if name.is_empty() {
        return None;
    }
    KEY_NAMES
        .iter()
        .find(|(_, candidate)| *candidate == name)
        .map(|(code, _)| *code)
}

/// `FBK_*` name of a key code
pub fn key_name(code: u8) -> Option<&'static str> {
    KEY_NAMES
        .binary_search_by_key(&code, |(c, _)| *c)
        .ok()
        .map(|index| KEY_NAMES[index].1)
}

/// Linux evdev key codes for FBK codes that differ from the set-1 scan code.
/// Codes 0x01..=0x58 are identical in both numberings.
const LINUX_EXTENDED: &[(u8, u16)] = &[
    (0x64, 183), // F13
    (0x65, 184),
    (0x66, 185),
    (0x70, 93), // KATAKANAHIRAGANA
    (0x79, 92), // HENKAN
    (0x7B, 94), // MUHENKAN
    (0x7D, 124), // YEN
    (0x8D, 117), // KPEQUAL
    (0x90, 165), // PREVIOUSSONG
    (0x99, 163), // NEXTSONG
    (0x9C, 96),  // KPENTER
    (0x9D, 97),  // RIGHTCTRL
    (0xA0, 113), // MUTE
    (0xA1, 140), // CALC
    (0xA2, 164), // PLAYPAUSE
    (0xA4, 166), // STOPCD
    (0xAE, 114), // VOLUMEDOWN
    (0xB0, 115), // VOLUMEUP
    (0xB2, 172), // HOMEPAGE
    (0xB3, 121), // KPCOMMA
    (0xB5, 98),  // KPSLASH
    (0xB7, 99),  // SYSRQ
    (0xB8, 100), // RIGHTALT
    (0xC5, 119), // PAUSE
    (0xC7, 102), // HOME
    (0xC8, 103), // UP
    (0xC9, 104), // PAGEUP
    (0xCB, 105), // LEFT
    (0xCD, 106), // RIGHT
    (0xCF, 107), // END
    (0xD0, 108), // DOWN
    (0xD1, 109), // PAGEDOWN
    (0xD2, 110), // INSERT
    (0xD3, 111), // DELETE
    (0xDB, 125), // LEFTMETA
    (0xDC, 126), // RIGHTMETA
    (0xDD, 127), // COMPOSE
    (0xDE, 116), // POWER
    (0xDF, 142), // SLEEP
    (0xE3, 143), // WAKEUP
    (0xE5, 217), // SEARCH
    (0xE6, 156), // BOOKMARKS
    (0xE7, 173), // REFRESH
    (0xE8, 128), // STOP
    (0xE9, 159), // FORWARD
    (0xEA, 158), // BACK
    (0xEB, 157), // COMPUTER
    (0xEC, 155), // MAIL
    (0xED, 226), // MEDIA
];

/// FBK code to backend key code table, owned by an input backend
#[derive(Clone, Debug)]
pub struct KeyLookup {
    native: [Option<u16>; 256],
}

impl KeyLookup {
    pub fn from_pairs(pairs: impl IntoIterator<Item = (u8, u16)>) -> Self {
        let mut native = [None; 256];
        for (fbk, code) in pairs {
            native[fbk as usize] = Some(code);
        }
        Self { native }
    }

    /// Table for Linux input event key codes
    pub fn linux() -> Self {
        Self::from_pairs(
            (0x01u8..=0x58)
                .filter(|code| key_name(*code).is_some())
                .map(|code| (code, code as u16))
                .chain(LINUX_EXTENDED.iter().copied()),
        )
    }

    pub fn native(&self, fbk: u8) -> Option<u16> {
        self.native[fbk as usize]
    }

    /// All FBK codes that have a backend key, with that key
    pub fn iter(&self) -> impl Iterator<Item = (u8, u16)> + '_ {
        self.native
            .iter()
            .enumerate()
            .filter_map(|(fbk, code)| code.map(|c| (fbk as u8, c)))
    }
}
