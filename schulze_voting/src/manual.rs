/*!

This is the long-form manual for `schulze_voting` and `schulzerank`.

## The method

Every voter ranks some or all of the candidates. Rank `1` is the most preferred.
Several candidates may share a rank, and candidates may be left out.

1. For every pair of candidates V and W, count `d[V,W]`, the number of voters who
   ranked both and put V strictly before W.
2. Draw a link from V to W with strength `d[V,W]` whenever `d[V,W] > d[W,V]`. The
   strength `p[V,W]` of the strongest path from V to W is the largest, over all the
   paths, of the weakest link on the path.
3. V beats W when `p[V,W] > p[W,V]`. Candidates are ranked by how many other
   candidates they beat. Candidates beating the same number of candidates are
   tied and are reported together. No tie is ever broken arbitrarily.

With several seats, whole groups are taken from the top until enough candidates
are selected: a tie at the cutoff selects all the tied candidates.

## Input formats

The following formats are supported:
* `csv` Comma Separated Values, one column per candidate
* `xlsx` Excel spreadsheet, same layout as `csv`
* `records` JSON records, as kept by a ballot store

### `csv`

The first row holds the names of the candidates. Each following row is one voter,
and each cell is the rank given to the candidate of that column.

```text
A,B,C
3,2,1
1,3,2
2,No opinion,3
```

An empty cell or the label `No opinion` means that the voter did not rank this
candidate. The label can be changed with `noOpinionLabel`.

An optional column holds the identifier of each voter (`idColumnIndex`, starting
at 1). Otherwise, voters are named after the file and the line number.

### `xlsx`

Same layout as `csv`, in the first worksheet of the file or in the worksheet named
by `excelWorksheetName` / `--excel-worksheet-name`.

### `records`

A JSON array, with one element per candidate ranked by a voter:

```text
[
  {"voter": "x", "candidate": "A", "rank": 1},
  {"voter": "x", "candidate": "B", "rank": 100000000}
]
```

The rank `100000000` means that the voter has no opinion about this candidate.

## Configuration

`schulzerank` can run directly on a file with `--input` and `--input-type`. For
more control, it accepts a configuration file in JSON with `--config`:

```text
{
  "outputSettings": {"contestName": "Steering committee"},
  "cvrFileSources": [{"provider": "csv", "filePath": "ballots.csv"}],
  "candidates": [{"name": "A"}, {"name": "B"}, {"name": "C"}],
  "rules": {"numberOfWinners": 1, "rejectUnknownCandidates": false}
}
```

- `candidates` may be left empty: they are then read from the first row of the
  first file source, or from the records.
- `numberOfWinners` (default 1) can be overriden with `--winners`.
- `rejectUnknownCandidates` (default false): by default, a ballot entry naming a
  candidate that is not declared is skipped with a warning. When set, such an
  entry stops the tabulation with an error.

## Outputs

The summary of the election is written in JSON to the location given by `--out`
(a file path or `stdout`). It contains the ranking from the winners down, the
winners, the pairwise defeats and a short textual summary.

With `--reference`, the summary is compared to a reference file and the
differences are printed. With `--export-ballots`, the ballots are written back as
a `csv` file, using `No opinion` for the candidates that a voter did not rank.

 */
