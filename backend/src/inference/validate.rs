use crate::error::PipelineError;

/// Checks the declared filename against the allow-list. Runs before any byte is decoded.
///
/// The filename doubles as the blob key, so path separators are refused outright.
pub fn validate_extension<'a>(
    filename: &'a str,
    allowed: &[String],
) -> Result<&'a str, PipelineError> {
    if filename.contains(['/', '\\']) {
        return Err(PipelineError::InvalidInput(
            "Invalid filename: path separators are not allowed".to_string(),
        ));
    }

    let extension = filename
        .rsplit_once('.')
        .map(|(_, ext)| ext)
        .filter(|ext| !ext.is_empty());

    match extension {
        Some(ext) if allowed.iter().any(|a| a.eq_ignore_ascii_case(ext)) => Ok(ext),
        _ => Err(PipelineError::InvalidInput(format!(
            "Invalid file type. Only {} allowed.",
            allowed.join(", ")
        ))),
    }
}

/// Best-effort display label: everything before the first underscore.
pub fn crop_name_from_filename(filename: &str) -> String {
    filename
        .split('_')
        .next()
        .unwrap_or(filename)
        .to_string()
}

pub fn content_type_for_extension(ext: &str) -> &'static str {
    match ext.to_lowercase().as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        "tif" | "tiff" => "image/tiff",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn allowed() -> Vec<String> {
        vec!["jpg".into(), "jpeg".into(), "png".into()]
    }

    #[test]
    fn test_accepts_allowed_case_insensitive() {
        assert_eq!(validate_extension("leaf.jpg", &allowed()).unwrap(), "jpg");
        assert_eq!(validate_extension("LEAF.JPG", &allowed()).unwrap(), "JPG");
        assert_eq!(validate_extension("maize_1.Png", &allowed()).unwrap(), "Png");
        assert_eq!(validate_extension("a.b.jpeg", &allowed()).unwrap(), "jpeg");
        assert_eq!(validate_extension(".jpg", &allowed()).unwrap(), "jpg");
    }

    #[test]
    fn test_rejects_missing_or_disallowed() {
        for name in ["leaf.gif", "leaf", "jpg", "leaf.", "", "leaf.jpg.exe", "leaf.bmp"] {
            let err = validate_extension(name, &allowed()).unwrap_err();
            assert!(matches!(err, PipelineError::InvalidInput(_)), "{}", name);
        }
    }

    #[test]
    fn test_rejects_path_separators() {
        for name in ["a/../leaf.jpg", "../leaf.jpg", "crops/leaf.png", "..\\leaf.jpg"] {
            let err = validate_extension(name, &allowed()).unwrap_err();
            let PipelineError::InvalidInput(msg) = &err else {
                panic!("unexpected error for {}: {:?}", name, err);
            };
            assert!(msg.contains("path separators"), "{}", name);
        }
    }

    #[test]
    fn test_crop_name() {
        assert_eq!(crop_name_from_filename("maize_leaf_01.jpg"), "maize");
        assert_eq!(crop_name_from_filename("leaf.jpg"), "leaf.jpg");
        assert_eq!(crop_name_from_filename("_odd.png"), "");
    }

    #[test]
    fn test_content_type() {
        assert_eq!(content_type_for_extension("JPG"), "image/jpeg");
        assert_eq!(content_type_for_extension("png"), "image/png");
        assert_eq!(content_type_for_extension("xyz"), "application/octet-stream");
    }
}
