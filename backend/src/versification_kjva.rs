//! KJVA versification: the KJV canon plus the 1611 Apocrypha, ordered as
//! in SWORD's canon_kjva.h. The apocrypha sit between Malachi and
//! Matthew and are stored in the OT data file.

use crate::versification::{BookDef, IntroLayout, Testament, VersificationSystem};
use crate::versification_kjv;

fn b(id: &str, name: &str, counts: &[i32]) -> BookDef {
    BookDef {
        id: id.to_string(),
        name: name.to_string(),
        abbrev: id.to_string(),
        testament: Testament::Ap,
        chapter_verse_counts: counts.to_vec(),
    }
}

fn apocrypha() -> Vec<BookDef> {
    vec![
        b("1Esd", "1 Esdras", &[58, 30, 24, 63, 73, 34, 15, 96, 55]),
        b("2Esd", "2 Esdras", &[40, 48, 36, 52, 56, 59, 70, 63, 47, 59, 46, 51, 58, 48, 63, 78]),
        b("Tob", "Tobit", &[22, 14, 17, 21, 22, 17, 18, 21, 6, 12, 19, 22, 18, 15]),
        b("Jdt", "Judith", &[16, 28, 10, 15, 24, 21, 32, 36, 14, 23, 23, 20, 20, 19, 13, 25]),
        b("AddEsth", "Additions to Esther", &[1, 1, 1, 1, 1, 1, 1, 1, 1, 13, 12, 6, 18, 19, 16, 24]),
        b("Wis", "Wisdom", &[16, 24, 19, 20, 23, 25, 30, 21, 18, 21, 26, 27, 19, 31, 19, 29, 21, 25, 22]),
        b("Sir", "Sirach", &[30, 18, 31, 31, 15, 37, 36, 19, 18, 31, 34, 18, 26, 27, 20, 30, 32, 33, 30, 31, 28, 27, 27, 34, 26, 29, 30, 26, 28, 25, 31, 24, 33, 31, 26, 31, 31, 34, 35, 30, 27, 25, 35, 23, 26, 20, 25, 25, 16, 29, 30]),
        b("Bar", "Baruch", &[22, 35, 37, 37, 9, 73]),
        b("PrAzar", "Prayer of Azariah", &[68]),
        b("Sus", "Susanna", &[64]),
        b("Bel", "Bel and the Dragon", &[42]),
        b("PrMan", "Prayer of Manasseh", &[1]),
        b("1Macc", "1 Maccabees", &[64, 70, 60, 61, 68, 63, 50, 32, 73, 89, 74, 53, 53, 49, 41, 24]),
        b("2Macc", "2 Maccabees", &[36, 32, 40, 50, 27, 31, 42, 36, 29, 38, 38, 45, 26, 46, 39]),
    ]
}

pub(crate) fn books() -> Vec<BookDef> {
    let kjv = versification_kjv::books();
    let mut books = Vec::with_capacity(kjv.len() + 14);
    for book in kjv {
        if book.testament == Testament::Nt && books.iter().all(|b: &BookDef| b.testament != Testament::Nt) {
            books.extend(apocrypha());
        }
        books.push(book);
    }
    books
}

pub fn system() -> VersificationSystem {
    VersificationSystem::new("KJVA", books(), IntroLayout::default())
}
