/// True for any status outside the 2xx success range.
pub fn is_bad_http_code(code: u16) -> bool {
    !(200..300).contains(&code)
}
