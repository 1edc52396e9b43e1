//! Amounts written out in Mexican-Spanish cheque style.

use crate::utils::round_money;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

const UNITS: [&str; 10] = [
    "", "UN", "DOS", "TRES", "CUATRO", "CINCO", "SEIS", "SIETE", "OCHO", "NUEVE",
];

const TEENS: [&str; 10] = [
    "DIEZ",
    "ONCE",
    "DOCE",
    "TRECE",
    "CATORCE",
    "QUINCE",
    "DIECISEIS",
    "DIECISIETE",
    "DIECIOCHO",
    "DIECINUEVE",
];

const TWENTIES: [&str; 10] = [
    "VEINTE",
    "VEINTIUN",
    "VEINTIDOS",
    "VEINTITRES",
    "VEINTICUATRO",
    "VEINTICINCO",
    "VEINTISEIS",
    "VEINTISIETE",
    "VEINTIOCHO",
    "VEINTINUEVE",
];

const TENS: [&str; 10] = [
    "", "", "", "TREINTA", "CUARENTA", "CINCUENTA", "SESENTA", "SETENTA", "OCHENTA", "NOVENTA",
];

const HUNDREDS: [&str; 10] = [
    "",
    "CIENTO",
    "DOSCIENTOS",
    "TRESCIENTOS",
    "CUATROCIENTOS",
    "QUINIENTOS",
    "SEISCIENTOS",
    "SETECIENTOS",
    "OCHOCIENTOS",
    "NOVECIENTOS",
];

const MILLION: u64 = 1_000_000;
const TRILLION: u64 = 1_000_000_000_000;

fn below_hundred(n: u64) -> String {
    let n = n as usize;
    match n {
        0..=9 => UNITS[n].to_string(),
        10..=19 => TEENS[n - 10].to_string(),
        20..=29 => TWENTIES[n - 20].to_string(),
        _ if n % 10 == 0 => TENS[n / 10].to_string(),
        _ => format!("{} Y {}", TENS[n / 10], UNITS[n % 10]),
    }
}

fn below_thousand(n: u64) -> String {
    if n == 100 {
        return "CIEN".to_string();
    }

    let hundreds = HUNDREDS[(n / 100) as usize];
    let rest = below_hundred(n % 100);
    join(hundreds, &rest)
}

fn below_million(n: u64) -> String {
    let thousands = n / 1000;
    let rest = below_thousand(n % 1000);

    let head = match thousands {
        0 => String::new(),
        1 => "MIL".to_string(),
        t => format!("{} MIL", below_thousand(t)),
    };

    join(&head, &rest)
}

fn integer_words(n: u64) -> String {
    if n == 0 {
        return "CERO".to_string();
    }

    let mut parts = Vec::new();

    let trillions = n / TRILLION;
    if trillions > 0 {
        parts.push(if trillions == 1 {
            "UN BILLON".to_string()
        } else {
            format!("{} BILLONES", below_million(trillions))
        });
    }

    let millions = (n % TRILLION) / MILLION;
    if millions > 0 {
        parts.push(if millions == 1 {
            "UN MILLON".to_string()
        } else {
            format!("{} MILLONES", below_million(millions))
        });
    }

    let rest = n % MILLION;
    if rest > 0 {
        parts.push(below_million(rest));
    }

    parts.join(" ")
}

fn join(head: &str, tail: &str) -> String {
    match (head.is_empty(), tail.is_empty()) {
        (true, _) => tail.to_string(),
        (false, true) => head.to_string(),
        (false, false) => format!("{} {}", head, tail),
    }
}

/// Spells a peso amount, e.g. `1500.5` becomes
/// `"MIL QUINIENTOS PESOS 50/100 M.N."`.
pub fn amount_to_words(amount: Decimal) -> String {
    let amount = round_money(amount);
    let negative = amount.is_sign_negative() && !amount.is_zero();
    let amount = amount.abs();

    let whole = amount.trunc();
    let cents = ((amount - whole) * Decimal::ONE_HUNDRED)
        .round()
        .to_u32()
        .unwrap_or(0);
    let whole = whole.to_u64().unwrap_or(u64::MAX);

    let currency = if whole == 1 {
        "PESO"
    } else if whole >= MILLION && whole % MILLION == 0 {
        "DE PESOS"
    } else {
        "PESOS"
    };

    let words = format!(
        "{} {} {:02}/100 M.N.",
        integer_words(whole),
        currency,
        cents
    );

    if negative {
        format!("MENOS {}", words)
    } else {
        words
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_small_numbers() {
        assert_eq!(integer_words(0), "CERO");
        assert_eq!(integer_words(1), "UN");
        assert_eq!(integer_words(15), "QUINCE");
        assert_eq!(integer_words(21), "VEINTIUN");
        assert_eq!(integer_words(30), "TREINTA");
        assert_eq!(integer_words(47), "CUARENTA Y SIETE");
        assert_eq!(integer_words(100), "CIEN");
        assert_eq!(integer_words(101), "CIENTO UN");
        assert_eq!(integer_words(555), "QUINIENTOS CINCUENTA Y CINCO");
    }

    #[test]
    fn test_large_numbers() {
        assert_eq!(integer_words(1000), "MIL");
        assert_eq!(integer_words(2001), "DOS MIL UN");
        assert_eq!(integer_words(100_000), "CIEN MIL");
        assert_eq!(integer_words(1_000_000), "UN MILLON");
        assert_eq!(
            integer_words(1_234_567),
            "UN MILLON DOSCIENTOS TREINTA Y CUATRO MIL QUINIENTOS SESENTA Y SIETE"
        );
        assert_eq!(integer_words(1_500_000_000), "MIL QUINIENTOS MILLONES");
        assert_eq!(integer_words(2_000_000_000_000), "DOS BILLONES");
    }

    #[test]
    fn test_amount_to_words() {
        assert_eq!(amount_to_words(dec!(0)), "CERO PESOS 00/100 M.N.");
        assert_eq!(amount_to_words(dec!(1)), "UN PESO 00/100 M.N.");
        assert_eq!(
            amount_to_words(dec!(1500.5)),
            "MIL QUINIENTOS PESOS 50/100 M.N."
        );
        assert_eq!(
            amount_to_words(dec!(3000000)),
            "TRES MILLONES DE PESOS 00/100 M.N."
        );
        assert_eq!(
            amount_to_words(dec!(21.999)),
            "VEINTIDOS PESOS 00/100 M.N."
        );
        assert_eq!(
            amount_to_words(dec!(-250.75)),
            "MENOS DOSCIENTOS CINCUENTA PESOS 75/100 M.N."
        );
    }
}
