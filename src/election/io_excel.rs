// Reading the same tables as io_csv, from Excel workbooks.

use calamine::{open_workbook, DataType, Range, Reader, Xlsx};

use crate::election::{
    io_common::{candidate_columns, make_default_id},
    *,
};

pub fn read_excel_columnar(
    path: &str,
    cfs: &FileSource,
) -> TabResult<(Vec<String>, Vec<ParsedBallot>)> {
    let default_id = make_default_id(path);
    let id_idx_o = cfs.id_column_index_int()?;

    let wrange = get_range(path, cfs)?;
    let mut rows = wrange.rows();

    let header_row = rows.next().context(EmptyTableSnafu { path })?;
    let header: Vec<String> = header_row
        .iter()
        .map(|cell| read_cell(cell, 1))
        .collect::<TabResult<Vec<String>>>()?;
    debug!("read_excel_columnar: header: {:?}", header);
    let columns = candidate_columns(&header, id_idx_o);

    let mut res: Vec<ParsedBallot> = Vec::new();
    for (idx, row) in rows.enumerate() {
        let lineno = idx + 2;
        let id = if let Some(id_idx) = id_idx_o {
            let cell = row.get(id_idx).context(ExcelRowTooShortSnafu { lineno })?;
            read_cell(cell, lineno)?
        } else {
            default_id(lineno)
        };

        let mut choices: Vec<(String, String)> = Vec::new();
        for (col, name) in columns.iter() {
            let content = match row.get(*col) {
                Some(cell) => read_cell(cell, lineno)?,
                None => String::new(),
            };
            choices.push((name.clone(), content));
        }
        debug!("read_excel_columnar: lineno: {:?} row: {:?}", lineno, &choices);

        res.push(ParsedBallot { id, choices });
    }
    Ok((
        columns.into_iter().map(|(_, name)| name).collect(),
        res,
    ))
}

fn get_range(path: &str, cfs: &FileSource) -> TabResult<Range<DataType>> {
    let mut workbook: Xlsx<_> = open_workbook(path).context(OpeningExcelSnafu { path })?;
    let wrange = match &cfs.excel_worksheet_name {
        Some(name) => workbook
            .worksheet_range(name)
            .context(MissingWorksheetSnafu { path, name })?,
        None => workbook
            .worksheet_range_at(0)
            .context(EmptyTableSnafu { path })?,
    };
    wrange.context(OpeningExcelSnafu { path })
}

// Spreadsheets store ranks as floating point numbers.
fn read_cell(cell: &DataType, lineno: usize) -> TabResult<String> {
    match cell {
        DataType::String(s) => Ok(s.trim().to_string()),
        DataType::Int(i) => Ok(i.to_string()),
        // Whole numbers only. Larger values would not be valid ranks anyway.
        DataType::Float(f) if f.fract() == 0.0 && *f >= 0.0 && *f < u64::MAX as f64 => {
            Ok(format!("{}", *f as u64))
        }
        DataType::Empty => Ok(String::new()),
        _ => ExcelWrongCellTypeSnafu {
            lineno,
            content: format!("{:?}", cell),
        }
        .fail(),
    }
}
