use approx::assert_relative_eq;
use ortho_geometry::{Affine, PixelWindow};
use ortho_image::{DynImage, Image, ImageSize};
use ortho_io::{create_raster_reader, create_raster_writer, raster_size, Crs, IoError};

#[test]
fn ortho_roundtrip_through_factories() -> Result<(), IoError> {
    let tmp_dir = tempfile::tempdir()?;
    let path = tmp_dir.path().join("ortho").join("IMG_0001.tif");

    let data = (0..(6 * 4 * 3)).map(|v| (v * 3) as u8).collect::<Vec<_>>();
    let ortho: DynImage = Image::<u8>::new([6, 4].into(), 3, data)?.into();
    let georef = Affine::new(500.0, 960.0, 0.25, -0.25, 0.0)?;

    let mut writer = create_raster_writer(&path)?;
    writer.open()?;
    assert!(writer.is_open());
    writer.create(ortho.layout())?;
    writer.set_crs(&Crs::new("EPSG:25830"));
    writer.set_georeference(&georef);
    writer.write(&ortho)?;
    writer.close()?;
    writer.close()?;

    let mut reader = create_raster_reader(&path)?;
    reader.open()?;
    assert_eq!(reader.layout(), Some(ortho.layout()));
    assert_eq!(reader.crs().map(|c| c.code().to_string()), Some("EPSG:25830".into()));
    assert_relative_eq!(reader.georeference().scale_x(), 0.25);
    assert_relative_eq!(reader.georeference().ty(), 960.0);

    let window = PixelWindow::new(4, 3, 4, 4);
    let crop = reader.read_window(&window)?;
    assert_eq!(crop.map(|c| c.size()), Some([2, 1].into()));
    assert_eq!(reader.read()?, ortho);
    reader.close();
    reader.close();

    assert_eq!(raster_size(&path)?, ImageSize { width: 6, height: 4 });
    Ok(())
}

#[test]
fn factories_reject_unknown_formats() {
    assert!(matches!(
        create_raster_reader("dtm.asc"),
        Err(IoError::InvalidFileExtension(_))
    ));
    assert!(create_raster_writer("ortho.png").is_err());
}
