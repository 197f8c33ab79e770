/// Build a [`Finding`](crate::types::Finding) for `$meta` in `$doc`.
///
/// Without `tag = ...` the finding carries the bare rule id.
#[macro_export]
macro_rules! finding {
    ($meta:expr, $doc:expr, $line:expr, tag = $tag:expr, $($msg:tt)+) => {
        $crate::types::Finding {
            file: $doc.path.clone(),
            line: $line,
            rule: $meta.id,
            tag: $tag,
            severity: $meta.severity,
            message: format!($($msg)+),
        }
    };
    ($meta:expr, $doc:expr, $line:expr, $($msg:tt)+) => {
        $crate::finding!($meta, $doc, $line, tag = $meta.id.to_string(), $($msg)+)
    };
}
