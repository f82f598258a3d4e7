//! # 元素周期表
//!
//! 原子序数与元素符号互查。序号 0 为占位符 `X`。
//!
//! ## 依赖关系
//! - 被 `models/structure.rs`, `parsers/vasp/` 使用
//! - 无外部模块依赖

const SYMBOLS: [&str; 119] = [
    "X", "H", "He", "Li", "Be", "B", "C", "N", "O", "F", "Ne", "Na", "Mg", "Al", "Si", "P", "S",
    "Cl", "Ar", "K", "Ca", "Sc", "Ti", "V", "Cr", "Mn", "Fe", "Co", "Ni", "Cu", "Zn", "Ga", "Ge",
    "As", "Se", "Br", "Kr", "Rb", "Sr", "Y", "Zr", "Nb", "Mo", "Tc", "Ru", "Rh", "Pd", "Ag", "Cd",
    "In", "Sn", "Sb", "Te", "I", "Xe", "Cs", "Ba", "La", "Ce", "Pr", "Nd", "Pm", "Sm", "Eu", "Gd",
    "Tb", "Dy", "Ho", "Er", "Tm", "Yb", "Lu", "Hf", "Ta", "W", "Re", "Os", "Ir", "Pt", "Au", "Hg",
    "Tl", "Pb", "Bi", "Po", "At", "Rn", "Fr", "Ra", "Ac", "Th", "Pa", "U", "Np", "Pu", "Am", "Cm",
    "Bk", "Cf", "Es", "Fm", "Md", "No", "Lr", "Rf", "Db", "Sg", "Bh", "Hs", "Mt", "Ds", "Rg", "Cn",
    "Nh", "Fl", "Mc", "Lv", "Ts", "Og",
];

/// 原子序数 → 元素符号
pub fn symbol(number: i32) -> Option<&'static str> {
    usize::try_from(number).ok().and_then(|z| SYMBOLS.get(z)).copied()
}

/// 元素符号 → 原子序数
///
/// VASP 的 POTCAR 标签可能带后缀（如 `Fe_pv`、`O_s`、`H/1234`），只取字母前缀匹配。
pub fn atomic_number(symbol: &str) -> Option<i32> {
    let bare: String = symbol
        .trim()
        .chars()
        .take_while(|c| c.is_ascii_alphabetic())
        .collect();
    SYMBOLS
        .iter()
        .skip(1)
        .position(|s| *s == bare)
        .map(|i| i as i32 + 1)
}
