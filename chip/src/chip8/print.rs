//! The pretty print implementation for the machine state, used for the dump
//! shown after a fault and for the memory listing.

use {
    super::{ChipSet, State},
    crate::timer::TimedWorker,
    num_traits::Unsigned,
    once_cell::sync::Lazy,
    std::fmt::{self, Write},
};

/// The amount of words printed per row.
const HEX_PRINT_STEP: usize = 8;

/// The amount of bytes a row of memory spans.
const ROW_SIZE: usize = HEX_PRINT_STEP * 2;

const END_OF_LINE: char = '\n';
const INDENT_FILLAMENT: char = '\t';

/// The values that are used when there are at lease two rows of zeros.
const FILLER_BASE: &str = "...";

/// Every value is printed with a `0x` prefix and four digits.
fn integer<T>(line: &mut String, data: T) -> fmt::Result
where
    T: fmt::UpperHex + Unsigned,
{
    write!(line, "{:#06X}", data)
}

/// The address range a row covers.
fn pointer(line: &mut String, from: usize, to: usize) -> fmt::Result {
    integer(line, from)?;
    line.push_str(" - ");
    integer(line, to)?;
    line.push_str(" :");
    Ok(())
}

fn indent_helper(text: &mut String, indent: usize) {
    for _ in 0..indent {
        text.push(INDENT_FILLAMENT);
    }
}

/// Prepares the row content used for runs of zero rows, it is as wide as a
/// row full of words.
static ZERO_FILLER: Lazy<String> = Lazy::new(|| {
    const WORD: &str = "0x0000";
    let full = HEX_PRINT_STEP * WORD.len() + (HEX_PRINT_STEP - 1);
    let filler = " ".repeat((full - 2 * WORD.len() - FILLER_BASE.len()) / 2);
    format!("{}{}{}{}{}", WORD, filler, FILLER_BASE, filler, WORD)
});

/// Will pretty print the content of the raw memory, rows of words with
/// their address range. Two or more rows of only zeros are collapsed into
/// a single one.
///
/// The data is assumed to start at address `0`.
pub fn memory_dump(memory: &[u8], indent: usize) -> String {
    // (from, to, content) where no content means a zero row
    let mut rows: Vec<(usize, usize, Option<String>)> = Vec::new();

    for (index, chunk) in memory.chunks(ROW_SIZE).enumerate() {
        let from = index * ROW_SIZE;
        let to = from + chunk.len() - 1;

        if chunk.iter().all(|&byte| byte == 0) {
            if let Some((_, last_to, None)) = rows.last_mut() {
                *last_to = to;
                continue;
            }
            rows.push((from, to, None));
            continue;
        }

        let words: Vec<String> = chunk
            .chunks(2)
            .map(|word| match *word {
                [high, low] => format!("{:#06X}", u16::from_be_bytes([high, low])),
                _ => format!("{:#04X}", word[0]),
            })
            .collect();
        rows.push((from, to, Some(words.join(" "))));
    }

    let mut res = String::new();
    for (from, to, content) in rows {
        indent_helper(&mut res, indent);
        // writing into a string can not fail
        let _ = pointer(&mut res, from, to);
        res.push(' ');
        match content {
            Some(content) => res.push_str(&content),
            None => res.push_str(&ZERO_FILLER),
        }
        res.push(END_OF_LINE);
    }
    // Remove unneded new line
    if res.ends_with(END_OF_LINE) {
        res.pop();
    }
    res
}

/// will pretty print all the integer data given, the offset is calculated from
/// the beginning of the data
fn integer_dump<T>(data: &[T], indent: usize) -> Result<String, fmt::Error>
where
    T: fmt::UpperHex + Unsigned + Copy,
{
    let mut res = String::new();
    for (index, chunk) in data.chunks(HEX_PRINT_STEP).enumerate() {
        let from = index * HEX_PRINT_STEP;
        indent_helper(&mut res, indent);
        pointer(&mut res, from, from + chunk.len() - 1)?;
        for entry in chunk {
            res.push(' ');
            integer(&mut res, *entry)?;
        }
        res.push(END_OF_LINE);
    }
    if res.ends_with(END_OF_LINE) {
        res.pop();
    }
    Ok(res)
}

impl<W: TimedWorker> fmt::Display for ChipSet<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut opc = String::new();
        indent_helper(&mut opc, 2);
        integer(&mut opc, self.opcode)?;

        let mut prc = String::new();
        indent_helper(&mut prc, 2);
        integer(&mut prc, self.program_counter)?;

        let mut ind = String::new();
        indent_helper(&mut ind, 2);
        integer(&mut ind, self.index_register)?;

        let state = match self.state {
            State::Running => "Running".to_string(),
            State::AwaitingKey { register } => format!("Awaiting key into V{:X}", register),
        };

        let timers = format!(
            "\t\tDelay {}, Sound {}",
            self.delay_timer.read(),
            self.sound_timer.read()
        );

        let reg = integer_dump(&self.registers, 2)?;
        let sta = if self.stack.is_empty() {
            "\t\tempty".to_string()
        } else {
            integer_dump(&self.stack, 2)?
        };
        let mem = memory_dump(self.memory.as_slice(), 2);

        write!(
            f,
            "Chipset {{\n\
                \tState :\n\t\t{}\n\
                \tOpcode :\n{}\n\
                \tProgram Counter :\n{}\n\
                \tIndex Register :\n{}\n\
                \tTimers :\n{}\n\
                \tRegister :\n{}\n\
                \tStack :\n{}\n\
                \tMemory :\n{}\n\
                }}",
            state, opc, prc, ind, timers, reg, sta, mem
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_rows_collapse() {
        let mut memory = vec![0u8; 0x60];
        memory[0x20] = 0x12;
        memory[0x21] = 0x34;

        let dump = memory_dump(&memory, 0);
        let lines: Vec<_> = dump.lines().collect();
        assert_eq!(
            lines,
            vec![
                "0x0000 - 0x001F : 0x0000                    ...                    0x0000",
                "0x0020 - 0x002F : 0x1234 0x0000 0x0000 0x0000 0x0000 0x0000 0x0000 0x0000",
                "0x0030 - 0x005F : 0x0000                    ...                    0x0000",
            ]
        );
    }

    #[test]
    fn test_filler_is_as_wide_as_a_row() {
        let row = vec!["0x0000"; HEX_PRINT_STEP].join(" ");
        assert_eq!(row.len(), ZERO_FILLER.len());
    }

    #[test]
    fn test_odd_tail_and_indent() {
        let dump = memory_dump(&[0xAB, 0xCD, 0xEF], 1);
        assert_eq!(dump, "\t0x0000 - 0x0002 : 0xABCD 0xEF");
    }

    #[test]
    fn test_integer_dump() {
        let data: Vec<u8> = (0..10).collect();
        let dump = integer_dump(&data, 0).unwrap();
        assert_eq!(
            dump,
            "0x0000 - 0x0007 : 0x0000 0x0001 0x0002 0x0003 0x0004 0x0005 0x0006 0x0007\n\
             0x0008 - 0x0009 : 0x0008 0x0009"
        );
    }
}
