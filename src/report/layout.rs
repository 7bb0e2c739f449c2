//! Page breaks of the printed entries table.
//!
//! The report is printed on A4 and rows must not be cut by a page break. After some entry rows
//! a group of blank spacer rows pushes the following rows to the next page. The first page holds
//! fewer rows when the parameters block is printed above the table.

/// Number of blank rows to insert after the entry row at `index`.
pub fn spacer_rows(index: usize, with_parameters: bool) -> usize {
    if with_parameters {
        spacer_rows_with_parameters(index)
    } else {
        spacer_rows_without_parameters(index)
    }
}

fn spacer_rows_without_parameters(i: usize) -> usize {
    let boundary = i == 21
        || (i > 22 && (i - 21) % 26 == 0 && i <= 47)
        || (i > 47 && (i - 20) % 26 == 0 && i < 96)
        || (i >= 96 && (i - 19) % 26 == 0 && i < 120)
        || (i > 120 && (i - 18) % 26 == 0 && i < 141)
        || (i > 140 && (i - 17) % 26 == 0 && i < 170)
        || (i > 169 && (i - 16) % 26 == 0 && i < 195)
        || (i > 195 && (i - 15) % 26 == 0);

    if !boundary {
        return 0;
    }

    let mut rows = 2;
    if i > 16 {
        rows += 1;
    }
    if [47, 72, 97, 122, 147, 172, 197, 222].contains(&i) {
        rows += 1;
    }
    rows
}

fn spacer_rows_with_parameters(i: usize) -> usize {
    let boundary = i == 16
        || (i > 17 && (i - 17) % 26 == 0 && i < 100)
        || (i > 100 && (i - 16) % 26 == 0 && i < 165)
        || (i > 165 && (i - 15) % 26 == 0 && i < 220)
        || (i > 220 && (i - 14) % 26 == 0);

    if !boundary {
        return 0;
    }

    let mut rows = 2;
    if i >= 16 {
        rows += 1;
    }
    if [120, 171, 222].contains(&i) {
        rows += 1;
    }
    rows
}
