use std::fs;
use std::path::PathBuf;

use approx::assert_relative_eq;
use ortho_camera::bundle::{read_image_list, read_offset};
use ortho_camera::{BundleReader, CameraError, CameraModel, Parameter};

const BUNDLE: &str = "# Bundle file v0.3
2 0
1000.0 0.1 0.01
1 0 0
0 -1 0
0 0 -1
0 0 100
1200.0 0 0
1 0 0
0 -1 0
0 0 -1
-10 0 100
";

#[test]
fn read_bundle_with_offset() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let bundle = dir.path().join("bundle.out");
    fs::write(&bundle, BUNDLE)?;

    let images = vec![PathBuf::from("a.jpg"), PathBuf::from("b.jpg")];
    let photos = BundleReader::new()
        .with_offset([500.0, 600.0, 0.0])
        .read(&bundle, &images, |_| Ok::<_, String>([400, 300].into()))?;

    assert_eq!(photos.len(), 2);

    let first = &photos[0];
    assert_eq!(first.name(), "a");
    let calib = &first.camera().calibration;
    assert_eq!(calib.model(), CameraModel::Radial2);
    assert_relative_eq!(calib.focal(), 1000.0);
    assert_relative_eq!(calib.parameter(Parameter::K1), 0.1);
    assert_relative_eq!(calib.parameter(Parameter::Cx), 200.0);
    assert_relative_eq!(calib.parameter(Parameter::Cy), 150.0);

    // C = -R^T t + offset
    let c = first.pose().position();
    assert_relative_eq!(c[0], 500.0);
    assert_relative_eq!(c[1], 600.0);
    assert_relative_eq!(c[2], 100.0);

    let c = photos[1].pose().position();
    assert_relative_eq!(c[0], 510.0);
    assert_relative_eq!(c[2], 100.0);
    Ok(())
}

#[test]
fn fixed_principal_point() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let bundle = dir.path().join("bundle.out");
    fs::write(&bundle, BUNDLE)?;

    let images = vec![PathBuf::from("a.jpg"), PathBuf::from("b.jpg")];
    let photos = BundleReader::new()
        .with_principal_point([199.5, 149.5])
        .read(&bundle, &images, |_| Ok::<_, String>([400, 300].into()))?;
    assert_eq!(photos[1].camera().calibration.principal_point(), [199.5, 149.5]);
    Ok(())
}

#[test]
fn camera_count_must_match() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let bundle = dir.path().join("bundle.out");
    fs::write(&bundle, BUNDLE)?;

    let images = vec![PathBuf::from("a.jpg")];
    let result = BundleReader::new().read(&bundle, &images, |_| Ok::<_, String>([4, 3].into()));
    assert!(matches!(result, Err(CameraError::CameraCountMismatch(2, 1))));
    Ok(())
}

#[test]
fn truncated_bundle() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let bundle = dir.path().join("bundle.out");
    fs::write(&bundle, "# Bundle file v0.3\n1 0\n1000 0 0\n1 0 0\n")?;

    let images = vec![PathBuf::from("a.jpg")];
    let result = BundleReader::new().read(&bundle, &images, |_| Ok::<_, String>([4, 3].into()));
    assert!(matches!(result, Err(CameraError::Parse { .. })));
    Ok(())
}

#[test]
fn image_list_falls_back_to_directory() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    fs::write(dir.path().join("IMG_1.jpg"), b"")?;
    let list = dir.path().join("list.txt");
    fs::write(&list, "IMG_1.jpg\n\n")?;

    let images = read_image_list(&list, Some(dir.path()))?;
    assert_eq!(images, vec![dir.path().join("IMG_1.jpg")]);

    fs::write(&list, "missing.jpg\n")?;
    assert!(matches!(
        read_image_list(&list, Some(dir.path())),
        Err(CameraError::ImageNotFound(_))
    ));
    Ok(())
}

#[test]
fn offset_file() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("offset.txt");
    fs::write(&path, "272000.5 4338000 12.25\n")?;
    assert_eq!(read_offset(&path)?, [272000.5, 4338000.0, 12.25]);

    fs::write(&path, "1 2\n")?;
    assert!(read_offset(&path).is_err());
    Ok(())
}
