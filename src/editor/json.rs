// JSON output
// JavaScript の JSON.stringify(value, null, 2) と同じ表記で書き出す

use std::io;

use serde::Serialize;
use serde_json::ser::{Formatter, PrettyFormatter, Serializer};
use serde_json::Value;

/// 2^53 を超える整数は JavaScript では倍精度に丸められる
const MAX_SAFE_INTEGER: u64 = 9_007_199_254_740_991;

/// インデントは PrettyFormatter に任せ、数値だけ JavaScript の表記にする
struct JsFormatter {
    pretty: PrettyFormatter<'static>,
}

impl JsFormatter {
    fn new() -> Self {
        Self {
            pretty: PrettyFormatter::with_indent(b"  "),
        }
    }
}

impl Formatter for JsFormatter {
    fn write_i64<W: ?Sized + io::Write>(&mut self, writer: &mut W, value: i64) -> io::Result<()> {
        if value.unsigned_abs() > MAX_SAFE_INTEGER {
            return self.write_f64(writer, value as f64);
        }
        write!(writer, "{}", value)
    }

    fn write_u64<W: ?Sized + io::Write>(&mut self, writer: &mut W, value: u64) -> io::Result<()> {
        if value > MAX_SAFE_INTEGER {
            return self.write_f64(writer, value as f64);
        }
        write!(writer, "{}", value)
    }

    fn write_f64<W: ?Sized + io::Write>(&mut self, writer: &mut W, value: f64) -> io::Result<()> {
        writer.write_all(js_number(value).as_bytes())
    }

    fn begin_array<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.pretty.begin_array(writer)
    }

    fn end_array<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.pretty.end_array(writer)
    }

    fn begin_array_value<W: ?Sized + io::Write>(&mut self, writer: &mut W, first: bool) -> io::Result<()> {
        self.pretty.begin_array_value(writer, first)
    }

    fn end_array_value<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.pretty.end_array_value(writer)
    }

    fn begin_object<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.pretty.begin_object(writer)
    }

    fn end_object<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.pretty.end_object(writer)
    }

    fn begin_object_key<W: ?Sized + io::Write>(&mut self, writer: &mut W, first: bool) -> io::Result<()> {
        self.pretty.begin_object_key(writer, first)
    }

    fn begin_object_value<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.pretty.begin_object_value(writer)
    }

    fn end_object_value<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.pretty.end_object_value(writer)
    }
}

pub(crate) fn to_js_pretty_string(value: &Value) -> serde_json::Result<String> {
    let mut out = Vec::new();
    let mut serializer = Serializer::with_formatter(&mut out, JsFormatter::new());
    value.serialize(&mut serializer)?;
    // serde_json は UTF-8 しか出力しない
    Ok(String::from_utf8_lossy(&out).into_owned())
}

/// Number.prototype.toString() と同じ規則で数値を文字列にする
pub(crate) fn js_number(value: f64) -> String {
    if !value.is_finite() {
        return "null".to_string();
    }
    if value == 0.0 {
        return "0".to_string();
    }

    // 最短の桁列と指数を {:e} から取り出す (例: "1.2345e-7")
    let formatted = format!("{:e}", value.abs());
    let (mantissa, exponent) = match formatted.split_once('e') {
        Some(parts) => parts,
        None => return formatted,
    };
    let digits: String = mantissa.chars().filter(|c| *c != '.').collect();
    let exponent: i32 = match exponent.parse() {
        Ok(exponent) => exponent,
        Err(_) => return formatted,
    };
    let k = digits.len() as i32;
    let n = exponent + 1;

    let body = if k <= n && n <= 21 {
        format!("{}{}", digits, "0".repeat((n - k) as usize))
    } else if 0 < n && n <= 21 {
        let (int, frac) = digits.split_at(n as usize);
        format!("{}.{}", int, frac)
    } else if -6 < n && n <= 0 {
        format!("0.{}{}", "0".repeat((-n) as usize), digits)
    } else {
        let sign = if n - 1 < 0 { '-' } else { '+' };
        let (first, rest) = digits.split_at(1);
        if rest.is_empty() {
            format!("{}e{}{}", first, sign, (n - 1).abs())
        } else {
            format!("{}.{}e{}{}", first, rest, sign, (n - 1).abs())
        }
    };

    if value.is_sign_negative() {
        format!("-{}", body)
    } else {
        body
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn numbers_follow_javascript_notation() {
        let cases = [
            (1.0, "1"),
            (-0.0, "0"),
            (2.5, "2.5"),
            (-2.5, "-2.5"),
            (100.0, "100"),
            (1e21, "1e+21"),
            (1e22, "1e+22"),
            (123456789012345680000.0, "123456789012345680000"),
            (1.5e-7, "1.5e-7"),
            (0.000001, "0.000001"),
            (0.1, "0.1"),
            (1.25e30, "1.25e+30"),
            (f64::NAN, "null"),
        ];
        for (value, expected) in cases {
            assert_eq!(js_number(value), expected, "{:?}", value);
        }
    }

    #[test]
    fn pretty_output_rewrites_floats_only() {
        let value: Value =
            serde_json::from_str(r#"{"mcpServers":{},"x":1.0,"y":1e22,"z":-0,"n":[3,-4,0.5]}"#).unwrap();
        let expected = "{\n  \"mcpServers\": {},\n  \"x\": 1,\n  \"y\": 1e+22,\n  \"z\": 0,\n  \"n\": [\n    3,\n    -4,\n    0.5\n  ]\n}";
        assert_eq!(to_js_pretty_string(&value).unwrap(), expected);
    }

    #[test]
    fn large_integers_are_rounded_like_doubles() {
        let value = json!({ "big": 12345678901234567890u64, "safe": 9007199254740991u64 });
        let out = to_js_pretty_string(&value).unwrap();
        assert!(out.contains("\"big\": 12345678901234567000"));
        assert!(out.contains("\"safe\": 9007199254740991"));
    }
}
